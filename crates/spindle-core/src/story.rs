//! The compiled story: passages and their command sequences.
//!
//! A [`Story`] is the unit the VM executes. It is produced by the frontend
//! and immutable afterwards. Passages are keyed by name; execution begins at
//! [`START_PASSAGE`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::expr::Expr;

/// Name of the passage where execution begins.
pub const START_PASSAGE: &str = "Start";

/// A named block of compiled commands.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub name: String,
    pub commands: Vec<Command>,
}

/// A single VM instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    /// Append literal text to the VM's text buffer.
    PrintText { text: String },
    /// Flush the text buffer to the screen in six-line pages.
    Pause,
    /// Replace the current passage and restart at instruction 0.
    JumpToPassage { target: String },
    /// Push a return frame and jump.
    CallPassage { target: String },
    /// Pop a return frame. Fatal on an empty stack.
    ReturnPassage,
    /// Invoke the music callback with the name and evaluated track number.
    SetMusic { name: String, track: Expr },
    /// Invoke the image callback.
    SetImage { name: String },
    /// Append to the pending selection list.
    AddSelection { text: String, target: String },
    /// Skip `skip_count` instructions (from this one, inclusive) when the
    /// condition is false; fall through into the body when true.
    If { condition: Expr, skip_count: usize },
    /// Evaluate and store into the variable map.
    SetVariable { name: String, value: Expr },
    /// Append the string form of the evaluated expression to the text buffer.
    PrintResult { value: Expr },
}

/// A compiled story: passage name to passage.
///
/// `BTreeMap` keeps iteration (and dump output) deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Story {
    passages: BTreeMap<String, Passage>,
}

impl Story {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a passage, returning the displaced one if the name was taken.
    pub fn insert(&mut self, passage: Passage) -> Option<Passage> {
        self.passages.insert(passage.name.clone(), passage)
    }

    pub fn passage(&self, name: &str) -> Option<&Passage> {
        self.passages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.passages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passages in name order.
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.passages.values()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PrintText { text } => write!(f, "text {text:?}"),
            Command::Pause => write!(f, "pause"),
            Command::JumpToPassage { target } => write!(f, "jump {target:?}"),
            Command::CallPassage { target } => write!(f, "call {target:?}"),
            Command::ReturnPassage => write!(f, "return"),
            Command::SetMusic { name, track } => write!(f, "music {name:?}, {track}"),
            Command::SetImage { name } => write!(f, "image {name:?}"),
            Command::AddSelection { text, target } => {
                write!(f, "selection {text:?} -> {target:?}")
            }
            Command::If { condition, skip_count } => {
                write!(f, "if {condition} skip {skip_count}")
            }
            Command::SetVariable { name, value } => write!(f, "set {name} = {value}"),
            Command::PrintResult { value } => write!(f, "print {value}"),
        }
    }
}

impl fmt::Display for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for passage in self.passages.values() {
            writeln!(f, ":: {}", passage.name)?;
            for (i, command) in passage.commands.iter().enumerate() {
                writeln!(f, "  {i:>3}  {command}")?;
            }
        }
        Ok(())
    }
}
