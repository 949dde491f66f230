//! Extendible hashing for CorvusDB.
//!
//! The buffer pool's page table is an extendible hash directory: a
//! power-of-two array of slots routing keys to bounded-capacity buckets
//! by the low bits of their hash. A full bucket splits locally, and the
//! directory doubles only when the splitting bucket already uses every
//! directory bit, so growth stays proportional to the hot part of the
//! key space.

mod extendible;

pub use extendible::ExtendibleHashTable;
