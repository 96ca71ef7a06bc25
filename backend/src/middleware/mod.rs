//! Request middleware.
//!
//! Trace identifiers and security response headers, applied to every route.

pub mod security_headers;
pub mod trace;

pub use security_headers::SecurityHeaders;
pub use trace::Trace;
