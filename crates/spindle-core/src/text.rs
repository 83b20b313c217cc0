//! Word wrapping for the six-line text panel.
//!
//! Greedy wrap: words fill a line up to `width` columns, explicit newlines
//! are preserved as line breaks, and words longer than the width are
//! hard-split. Trailing empty lines are dropped so a buffer ending in `\n`
//! does not burn a page slot on a blank line.

/// Wrap `text` to lines of at most `width` characters.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut line = String::new();
        for word in raw.split_whitespace() {
            let mut word = word;
            // Hard-split anything that cannot fit on a line of its own.
            while word.chars().count() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let split = word
                    .char_indices()
                    .nth(width)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split].to_string());
                word = &word[split..];
            }
            let needed = word.chars().count() + if line.is_empty() { 0 } else { 1 };
            if line.chars().count() + needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("Hello", 10), vec!["Hello"]);
    }

    #[test]
    fn wraps_at_word_boundary() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn exact_width_fits() {
        assert_eq!(wrap_text("abcdefghij", 10), vec!["abcdefghij"]);
    }

    #[test]
    fn explicit_newlines_break_lines() {
        assert_eq!(wrap_text("one\ntwo", 10), vec!["one", "two"]);
    }

    #[test]
    fn interior_blank_lines_preserved() {
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn trailing_newline_dropped() {
        assert_eq!(wrap_text("one\n", 10), vec!["one"]);
        assert_eq!(wrap_text("one\n\n", 10), vec!["one"]);
    }

    #[test]
    fn long_word_hard_split() {
        assert_eq!(
            wrap_text("abcdefghijklm", 5),
            vec!["abcde", "fghij", "klm"]
        );
    }

    #[test]
    fn long_word_after_short_one() {
        assert_eq!(
            wrap_text("hi abcdefgh", 5),
            vec!["hi", "abcde", "fgh"]
        );
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn runs_of_spaces_collapse() {
        assert_eq!(wrap_text("a   b", 10), vec!["a b"]);
    }
}
