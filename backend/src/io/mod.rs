//! # IO Module
//!
//! Interface layer between HTTP clients and the domain logic. Translates
//! requests into domain commands, formats domain results as `shared` DTOs,
//! and maps domain errors onto HTTP status codes.
//!
//! ## Supported Operations
//!
//! - Sleep log lifecycle (start, append event, delete, list by date)
//! - Change-trigger entry point for externally written logs
//! - Daily summary reads and manual recalculation

pub mod rest;

pub use rest::*;
