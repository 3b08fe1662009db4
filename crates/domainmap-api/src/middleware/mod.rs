//! API Middleware
//!
//! Request-processing layers shared by the API routes.

pub mod domain;

pub use domain::{request_host, resolve_request_domain, RequestDomain};
