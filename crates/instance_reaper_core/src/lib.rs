//! Shared instance-reaper domain primitives.
//!
//! This crate owns the trigger-event contract, the response envelope, and
//! lifecycle state classification for observed instances. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod lifecycle;
