use crate::domain_port::Navigator;
use crate::logger::*;
use std::sync::Mutex;

/// Tracks the current location in memory. Outside a browser, "navigating"
/// to the login page means recording it and telling the operator.
#[derive(Debug)]
pub struct LocationNavigator {
    location: Mutex<String>,
}

impl LocationNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(initial.into()),
        }
    }
}

impl Default for LocationNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for LocationNavigator {
    fn current_path(&self) -> String {
        match self.location.lock() {
            Ok(location) => location.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn navigate(&self, location: &str) {
        info!(to = location, "navigating");
        match self.location.lock() {
            Ok(mut current) => *current = location.to_owned(),
            Err(poisoned) => *poisoned.into_inner() = location.to_owned(),
        }
    }
}
