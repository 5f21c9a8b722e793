//! HTTP surface over the resolution pipeline.
//!
//! A thin axum layer: handlers parse query parameters, delegate to the
//! pipeline, and map its errors onto status codes. Failure details stay
//! in the logs; response bodies carry stable error strings only.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{AppState, router};
