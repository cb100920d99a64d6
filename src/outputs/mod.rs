//! Output writers for the archived collection.
//!
//! # Submodules
//!
//! - [`json`]: Writes the cleaned articles to the tracked JSON file
//!
//! The file is rewritten in full on every run; history lives in the
//! data-version tool rather than in the file itself.

pub mod json;
