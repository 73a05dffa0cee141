//! HTTP request handlers for the mock server.

pub mod filer;
pub mod probes;

pub use filer::*;
pub use probes::*;
