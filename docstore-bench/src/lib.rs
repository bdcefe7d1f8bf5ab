//! Docstore Benchmark Library
//!
//! Data generators and connection fixtures shared by the benchmarks.

pub mod data_gen;
pub mod stores;
