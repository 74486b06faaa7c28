//! Integration test suite.
//!
//! Tests are organized by area:
//! 1. End-to-end table workflows
//! 2. Persistence integration
//! 3. Concurrent access smoke tests

pub mod end_to_end_tests;
pub mod persistence_tests;
pub mod system_smoke_tests;
