pub mod api;
pub mod envelope;
pub mod types;

pub use api::{ApiError, HttpTransport, Transport};
pub use envelope::Shape;
