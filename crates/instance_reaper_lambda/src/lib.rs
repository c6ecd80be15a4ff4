//! AWS-oriented adapters and handler for the instance reaper.
//!
//! This crate owns runtime integration details (the Lambda handler, the EC2
//! adapter seam, and wall-clock waiting) on top of the contract and
//! lifecycle primitives in `instance_reaper_core`.

pub mod adapters;
pub mod handlers;
