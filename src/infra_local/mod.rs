mod file_auth_storage;
mod location_navigator;
mod memory_auth_storage;

pub use file_auth_storage::*;
pub use location_navigator::*;
pub use memory_auth_storage::*;
