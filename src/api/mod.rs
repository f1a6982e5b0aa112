//! REST API client module for the nursery management service.
//!
//! This module provides the `ApiClient` for communicating with the
//! remote API to fetch roster, attendance, progress, and communication
//! data and to submit writes.
//!
//! The API uses JWT bearer token authentication obtained through the
//! login endpoint. Requests are never retried automatically; a failure
//! surfaces immediately and retry is up to the user.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
