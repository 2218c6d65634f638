//! # Storage Module
//!
//! Handles all data persistence for the sleep tracker backend.
//!
//! The domain layer only sees the traits in [`traits`]: a query that returns
//! every sleep log filed under a (child, date), and an upsert-by-key write for
//! daily summaries. [`csv`] is the file-based implementation used by the
//! binary; any other backend can be slotted in by implementing
//! [`Connection`].

pub mod csv;
pub mod traits;

pub use csv::CsvConnection;
pub use traits::{Connection, DailySummaryStorage, SleepLogStorage};
