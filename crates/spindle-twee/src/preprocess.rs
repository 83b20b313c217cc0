//! Passage splitting.
//!
//! Twee source is a flat file of passages, each introduced by a line whose
//! first two characters are `::`. This stage slices the file into raw
//! passages ahead of tokenizing, recording the file line each body starts
//! on so downstream errors carry file-level positions.

/// One passage's raw source, not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPassage {
    /// Passage name: the `::` line remainder, trimmed.
    pub name: String,
    /// Body text, trailing newlines and spaces stripped.
    pub body: String,
    /// 1-based file line number of the first body line.
    pub start_line: usize,
}

/// Split source text into raw passages.
///
/// Line endings are normalised to `\n` first. Anything before the first
/// `::` line is ignored.
pub fn split_passages(source: &str) -> Vec<RawPassage> {
    let normalized = source.replace("\r\n", "\n");
    let mut passages = Vec::new();
    let mut current: Option<RawPassage> = None;

    for (idx, line) in normalized.split('\n').enumerate() {
        if line.starts_with("::") {
            if let Some(passage) = current.take() {
                passages.push(strip_trailing(passage));
            }
            current = Some(RawPassage {
                name: line[2..].trim().to_string(),
                body: String::new(),
                start_line: idx + 2,
            });
        } else if let Some(passage) = current.as_mut() {
            passage.body.push_str(line);
            passage.body.push('\n');
        }
    }
    if let Some(passage) = current.take() {
        passages.push(strip_trailing(passage));
    }
    passages
}

fn strip_trailing(mut passage: RawPassage) -> RawPassage {
    let keep = passage.body.trim_end_matches(['\n', '\r', ' ']).len();
    passage.body.truncate(keep);
    passage
}
