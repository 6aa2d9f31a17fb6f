use std::fmt::{Display, Formatter};
use regex::{Regex, RegexSet};
use crate::XpsError;
use crate::header_defs::Label;


/// A recognised header line: exactly one slot of the label table is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    pub label: Label,
    pub value: String,
    /// 1-based line number in the source text
    pub line: usize,
}

impl HeaderLine {
    pub fn is_group(&self) -> bool {
        self.label == Label::Group
    }

    pub fn is_region(&self) -> bool {
        self.label == Label::Region
    }
}

impl Display for HeaderLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} = {}", self.line, self.label, self.value)
    }
}

/// Matches export text line by line against the fixed label table.
#[derive(Debug)]
pub struct HeaderTokenizer {
    set: RegexSet,
    /// one compiled pattern per slot, same order as the set
    captures: Vec<Regex>,
}

impl HeaderTokenizer {

    pub fn new() -> Result<Self, XpsError> {
        let set = Label::regex_set()?;
        let captures = Label::ALL.iter()
            .map(|l| Regex::new(&l.pattern()))
            .collect::<Result<Vec<Regex>, regex::Error>>()?;
        Ok(HeaderTokenizer { set, captures })
    }

    /// Ordered header lines of `text`. Lines matching no slot are dropped.
    pub fn tokenize(&self, text: &str) -> Vec<HeaderLine> {
        text.lines()
            .enumerate()
            .filter_map(|(i, raw_line)| self.classify(raw_line, i + 1))
            .collect()
    }

    /// Match a single line. The lowest matching slot wins.
    pub fn classify(&self, raw_line: &str, line: usize) -> Option<HeaderLine> {
        let slot = self.set.matches(raw_line).iter().next()?;
        let value = self.captures[slot]
            .captures(raw_line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())?;
        Some(HeaderLine { label: Label::ALL[slot], value, line })
    }
}
