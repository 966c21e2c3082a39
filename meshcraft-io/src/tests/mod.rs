//! Test modules for meshcraft-io
//!
//! End-to-end checks of format detection, multi-solid reading and file
//! round trips through both codecs.

pub mod detection_tests;
