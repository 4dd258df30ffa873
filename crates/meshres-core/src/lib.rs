//! Core types and services for the meshres resource store.
//!
//! No HTTP or database dependencies live here. Storage
//! backends implement [`backend::Backend`]; transports wrap
//! [`service::ResourceService`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod registry;
pub mod request;
pub mod resource;
pub mod service;
pub mod validate;

pub use error::{Code, Error, Result};
pub use service::{ResourceService, RetryConfig};
