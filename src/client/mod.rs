//! HTTP access to the system under test.

#[allow(clippy::module_inception)]
mod client;
mod models;

pub use client::{ApiClient, ApiTransport, TransportError};
pub use models::{ApiRequest, ApiResponse, HttpMethod, RequestBody};
