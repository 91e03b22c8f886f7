//! Reexports the logging macros from the `log` crate, so that every module
//! can pull them in with:
//!
//! ```ignore
//! use crate::log::*;
//! ```

pub use log::{log, trace, debug, info, warn, error};
