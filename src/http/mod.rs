//! HTTP fetch capability.

mod client;

pub use client::{FetchResponse, HttpClient};
