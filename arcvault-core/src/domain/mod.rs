//! Core domain types
//!
//! This module contains the domain structures shared across the arcvault
//! crates: the container record model consumed by batch jobs, and the
//! accounting types a batch run produces.

pub mod batch;
pub mod record;
