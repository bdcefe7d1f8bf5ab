//! Shared fixtures for the docstore integration tests.

pub mod test_util;
