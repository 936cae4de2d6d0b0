mod http_refresh_transport;

pub use http_refresh_transport::*;
