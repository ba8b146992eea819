//! Integration tests for the processor module
//!
//! Exercise rename, organize and index against synthetic extracted trees.

pub mod processing_flow;
