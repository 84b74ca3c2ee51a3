//! Output formatters for duplicate scan results.
//!
//! This module provides different output formats for scan results:
//! - Plain-text blocks, one per group, for people and simple pipes
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use bytedupe::duplicates::DuplicateFinder;
//! use bytedupe::error::ExitCode;
//! use bytedupe::output::{JsonOutput, TextOutput};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! print!("{}", TextOutput::new(&groups).render());
//!
//! let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::JsonOutput;
pub use text::TextOutput;
