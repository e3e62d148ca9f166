//! Debug-marker scanning over raw assembly text.
//!
//! The front-end compiler interleaves comment lines such as
//!
//! ```text
//! # SNAPIDX 4 assign x line 12
//! ```
//!
//! with the instructions it emits. Every instruction after a marker belongs
//! to the marker's source line until the next marker.

use crate::model::LineInstructionMap;

/// Classification of one assembly line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A marker; carries the new cursor value (`None` if it names no valid line).
    Marker(Option<u32>),
    /// Anything else.
    Instruction,
}

/// Scans assembly text for recognized marker tags.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    tags: Vec<String>,
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::with_tags(["# SNAPIDX", "# MARK"])
    }
}

impl MarkerScanner {
    /// Scanner recognizing exactly `tags`.
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Classify one line.
    ///
    /// A marker is a line starting with a recognized tag followed by
    /// whitespace or end of line. Its cursor value is the integer after the
    /// last `line` keyword; a missing keyword, an unparsable integer or zero
    /// all yield `None`.
    pub fn classify(&self, line: &str) -> LineKind {
        let trimmed = line.trim_start();
        for tag in &self.tags {
            let Some(rest) = trimmed.strip_prefix(tag.as_str()) else {
                continue;
            };
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                continue;
            }
            return LineKind::Marker(parse_line_number(rest));
        }
        LineKind::Instruction
    }

    /// Build the line -> instruction map from `assembly`.
    ///
    /// Instructions seen before the first valid marker, or after a marker
    /// without a valid line, are left out. Instruction text is kept verbatim.
    pub fn scan(&self, assembly: &str) -> LineInstructionMap {
        let mut map = LineInstructionMap::new();
        let mut current_line: Option<u32> = None;

        for line in assembly.lines() {
            match self.classify(line) {
                LineKind::Marker(next) => current_line = next,
                LineKind::Instruction => {
                    if let Some(n) = current_line {
                        map.entry(n).or_default().push(line.to_string());
                    }
                }
            }
        }

        map
    }
}

fn parse_line_number(rest: &str) -> Option<u32> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let keyword = tokens.iter().rposition(|t| *t == "line")?;
    tokens
        .get(keyword + 1)?
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
}
