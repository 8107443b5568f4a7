//! # Stackstore Testkit
//!
//! Shared test utilities: proptest strategies for core values and store
//! shapes, plus deterministic fixtures for hand-written tests.

pub mod fixtures;
pub mod generators;
