//! Arcvault Core
//!
//! Core types and abstractions for the arcvault archive access layer.
//!
//! This crate contains:
//! - Domain types: the container record model and batch accounting
//! - Container reader: lazy record scanning over local container files
//! - DTOs: serializable batch reports for downstream consumers
//! - The error taxonomy shared by the client and the batch engine

pub mod container;
pub mod domain;
pub mod dto;
pub mod error;
