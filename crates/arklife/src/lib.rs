//! # arklife
//!
//! Command layer shared by the `arklife` binary and its integration tests.
//! Each operation takes the immutable [`config::Config`] by reference.

pub mod config;
pub mod pipeline;
