mod token_refresh_service;

pub use token_refresh_service::*;
