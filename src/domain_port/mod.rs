mod auth_storage;
mod clock;
mod navigator;
mod refresh_transport;

pub use auth_storage::*;
pub use clock::*;
pub use navigator::*;
pub use refresh_transport::*;
