//! Twee frontend for the Spindle story engine.
//!
//! Compiles a restricted Twee dialect into a [`spindle_core::Story`]:
//! `::Name` delimited passages containing narrative text, `<<command>>`
//! macros, the `[img[NAME]]` special, and `* [[TEXT|TARGET]]` selections.
//!
//! The pipeline is preprocessor (passage splitting), dual-mode tokenizer,
//! and recursive-descent parser; see the module docs of each stage.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod preprocess;

pub use error::CompileError;

use spindle_core::{Story, START_PASSAGE};

/// Compile Twee source into a story.
///
/// The caller is expected to have stripped any byte-order mark; line
/// endings are normalised here. Fails on the first parse error, on a
/// duplicate passage name, and when the `"Start"` passage is missing.
pub fn compile(source: &str) -> Result<Story, CompileError> {
    let mut story = Story::new();
    for raw in preprocess::split_passages(source) {
        let passage = parser::parse_passage(&raw.name, &raw.body, raw.start_line)?;
        if story.insert(passage).is_some() {
            return Err(CompileError::DuplicatePassage(raw.name));
        }
    }
    if !story.contains(START_PASSAGE) {
        return Err(CompileError::MissingStart);
    }
    Ok(story)
}
