mod refresh_monitor;
mod token_refresh_service_fake;
mod token_refresh_service_impl;

pub use refresh_monitor::*;
pub use token_refresh_service_fake::*;
pub use token_refresh_service_impl::*;
