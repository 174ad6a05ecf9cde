mod http_transport;
mod prepared_backend;

pub use http_transport::HttpTransport;
pub use prepared_backend::PreparedBackend;
