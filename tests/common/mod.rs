//! Shared utilities for integration tests
//!
//! Not every test binary uses every helper.
#![allow(dead_code, unused_imports)]

mod fixtures;

pub use fixtures::{
    corpus, init_tracing, scan, write_corpus, ARCHITECTURE_GUIDE, ARCHITECTURE_PATTERNS,
    TESTING_STANDARDS,
};
