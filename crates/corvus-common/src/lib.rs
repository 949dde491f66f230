//! # corvus-common
//!
//! Common types and constants for CorvusDB.
//!
//! This crate provides the foundational pieces shared across CorvusDB
//! components:
//!
//! - **Types**: core identifiers such as [`types::PageId`]
//! - **Constants**: system-wide constants and limits
//!
//! ## Example
//!
//! ```rust
//! use corvus_common::types::PageId;
//!
//! let page_id = PageId::new(42);
//! assert!(page_id.is_valid());
//! assert_eq!(page_id.file_offset(4096), 42 * 4096);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::PageId;
