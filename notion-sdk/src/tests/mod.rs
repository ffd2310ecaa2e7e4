//! Unit tests for the Notion SDK
//!
//! This module contains tests for the pipeline, the transports and the
//! Notion client.

pub mod pipeline_tests;
