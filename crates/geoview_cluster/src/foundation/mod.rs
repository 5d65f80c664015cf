//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Double-precision math types and frustum helpers
//! - Frame and wall-clock time
//! - Logging setup

pub mod math;
pub mod time;
pub mod logging;
