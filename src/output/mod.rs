//! Output formatting module
//!
//! Provides the banner formatters and the header/summary builders.

#![allow(dead_code)]

mod banner;
mod formatter;
mod script;

pub use banner::{Backend, BannerRenderer};
pub use formatter::{Document, FormatterKind, DEFAULT_WIDTH};
pub use script::DEFAULT_INTERPRETER;
