//! Target-script detection
//!
//! Output is judged by Unicode block membership only. The target script
//! (Sinhala, U+0D80..U+0DFF) occupies a block disjoint from the Latin input,
//! which is what makes both the classifier and the whole-page fallback work.

use regex::Regex;

/// A writing system identified by a contiguous Unicode block
#[derive(Debug, Clone)]
pub struct TargetScript {
    name: &'static str,
    first: char,
    last: char,
    run: Regex,
}

impl TargetScript {
    /// Build a target script from its block bounds (inclusive)
    pub fn new(name: &'static str, first: char, last: char) -> Self {
        let class = format!(r"\x{{{:04X}}}-\x{{{:04X}}}", first as u32, last as u32);
        // One script char, then script chars, whitespace or light punctuation,
        // closed by a script char.
        let pattern = format!(r"[{class}][{class}\s,\.!?]*[{class}]");
        let run = Regex::new(&pattern).unwrap_or_else(|e| {
            unreachable!("script run pattern {pattern} is malformed: {e}")
        });

        Self { name, first, last, run }
    }

    /// The Sinhala block
    pub fn sinhala() -> Self {
        Self::new("Sinhala", '\u{0D80}', '\u{0DFF}')
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn contains_char(&self, c: char) -> bool {
        (self.first..=self.last).contains(&c)
    }

    /// True if at least one character of `text` is in the block
    pub fn appears_in(&self, text: &str) -> bool {
        text.chars().any(|c| self.contains_char(c))
    }

    pub fn count_in(&self, text: &str) -> usize {
        text.chars().filter(|c| self.contains_char(*c)).count()
    }

    /// Share of characters in `text` that belong to the block; 0.0 for empty text
    pub fn ratio(&self, text: &str) -> f64 {
        let total = text.chars().count();
        if total == 0 {
            return 0.0;
        }
        self.count_in(text) as f64 / total as f64
    }

    /// First maximal run of script text embedded in arbitrary page text.
    ///
    /// Heuristic: a run needs at least two script characters and may span
    /// whitespace and `,.!?`. Joiners outside the block (ZWJ) split runs.
    pub fn find_run<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.run.find(text).map(|m| m.as_str())
    }
}

impl Default for TargetScript {
    fn default() -> Self {
        Self::sinhala()
    }
}
