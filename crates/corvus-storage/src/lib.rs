//! # corvus-storage
//!
//! Page-oriented storage core for CorvusDB.
//!
//! This crate implements the memory side of the storage engine:
//! - A buffer pool that caches disk pages in fixed-size frames, with
//!   pin counting, dirty tracking, and LRU-K eviction
//! - An extendible hash directory used as the pool's page table
//! - A blocking, page-granular disk abstraction with file-backed and
//!   in-memory implementations

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Buffer pool manager, frames, and eviction policy
pub mod buffer;

/// Page-granular disk I/O
pub mod disk;

/// Extendible hashing
pub mod hash;
