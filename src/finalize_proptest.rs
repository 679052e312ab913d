//! Property-based tests for route filtering and template unwrapping.
//!
//! These tests use proptest to generate random collections and verify that
//! the filtering and unwrapping invariants hold for all of them.
