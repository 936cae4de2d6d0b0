/// Where the user currently is, and how to send them somewhere else.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, location: &str);
}
