//! Type definitions for CorvusDB.
//!
//! This module contains the core identifier types used across the database.

mod ids;

pub use ids::PageId;
