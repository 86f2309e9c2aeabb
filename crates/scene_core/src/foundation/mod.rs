//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and operations
//! - Object identifiers and their allocator
//! - Logging utilities

pub mod ids;
pub mod logging;
pub mod math;
