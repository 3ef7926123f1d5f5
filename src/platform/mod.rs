//! Seqera Platform REST API access.

pub mod client;

pub use client::{PlatformClient, PlatformError};
