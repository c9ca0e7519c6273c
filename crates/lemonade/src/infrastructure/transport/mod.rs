//! TCP transport between the client and an endpoint.

pub mod client;
pub mod connection;

pub use client::{LocalEndpointHost, TransportClient};
pub use connection::{read_message, write_message, ConnectionError, EndpointConnection};
