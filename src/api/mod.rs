pub mod client;
pub mod transport;

#[cfg(test)]
pub mod stub;
#[cfg(test)]
mod stub_server;

pub use client::{normalize_base_url, ApiClient};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
