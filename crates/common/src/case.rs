//! Test case definitions

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// What a test case expects from the system under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    /// Input should convert successfully
    Positive,
    /// Input should fail or degrade
    Negative,
    /// Output should update while the input is typed
    #[serde(rename = "ui-realtime")]
    UiRealtime,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Positive => "positive",
            Intent::Negative => "negative",
            Intent::UiRealtime => "ui-realtime",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse input length bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthClass {
    #[serde(rename = "S")]
    Short,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Long,
}

impl LengthClass {
    pub fn code(&self) -> &'static str {
        match self {
            LengthClass::Short => "S",
            LengthClass::Medium => "M",
            LengthClass::Long => "L",
        }
    }
}

/// Corpus bucket derived from the id prefix, used for completeness checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PositiveFunctional,
    NegativeFunctional,
    Ui,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::PositiveFunctional,
        Category::NegativeFunctional,
        Category::Ui,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Category::PositiveFunctional => "Pos_Fun",
            Category::NegativeFunctional => "Neg_Fun",
            Category::Ui => "Pos_UI",
        }
    }

    /// Minimum number of executed cases a complete run needs
    pub fn required(&self) -> usize {
        match self {
            Category::PositiveFunctional => 24,
            Category::NegativeFunctional => 10,
            Category::Ui => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::PositiveFunctional => "Positive Tests",
            Category::NegativeFunctional => "Negative Tests",
            Category::Ui => "UI Tests",
        }
    }

    pub fn of_id(id: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| id.starts_with(c.prefix()))
    }
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(Pos|Neg)_(Fun|UI)_\d{4}$")
            .unwrap_or_else(|e| unreachable!("case id pattern is malformed: {e}"))
    })
}

/// A single corpus entry. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique id, `{Pos|Neg}_{Fun|UI}_NNNN`
    pub id: String,

    #[serde(alias = "desc")]
    pub description: String,

    pub input: String,

    /// Expected conversion, or a failure marker for negative cases
    pub expected: String,

    /// Input type / domain tag
    #[serde(alias = "type")]
    pub domain: String,

    /// Sentence / grammar focus tag
    pub grammar: String,

    pub length: LengthClass,

    pub intent: Intent,
}

impl TestCase {
    pub fn category(&self) -> Option<Category> {
        Category::of_id(&self.id)
    }

    /// Check id shape and that the id prefix agrees with the intent
    pub fn validate(&self) -> Result<()> {
        if !id_pattern().is_match(&self.id) {
            return Err(Error::InvalidCase(format!(
                "id '{}' does not match {{Pos|Neg}}_{{Fun|UI}}_NNNN",
                self.id
            )));
        }

        let consistent = match (self.category(), self.intent) {
            (Some(Category::PositiveFunctional), Intent::Positive) => true,
            (Some(Category::NegativeFunctional), Intent::Negative) => true,
            (Some(Category::Ui), Intent::UiRealtime) => true,
            _ => false,
        };
        if !consistent {
            return Err(Error::InvalidCase(format!(
                "id '{}' is inconsistent with intent {}",
                self.id, self.intent
            )));
        }

        if self.input.is_empty() {
            return Err(Error::InvalidCase(format!("'{}' has empty input", self.id)));
        }

        Ok(())
    }
}
