//! Integration tests for the udslink bridge
//!
//! See `tests/` for the actual test suites. This crate exists so the
//! end-to-end tests can depend on every workspace crate at once.
