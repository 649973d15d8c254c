pub mod client;

pub use client::{BasicCredentials, RateLimitedHttpClient, RawResponse, TransportFault};
