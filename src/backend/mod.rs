//! Allocator backend implementations
//!
//! This module contains concrete allocator implementations.

/// Pool allocator with hash-sealed block headers
#[cfg(feature = "encpool")]
pub mod encpool;
