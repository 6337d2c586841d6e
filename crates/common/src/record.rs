//! Result records and the run-wide accumulator

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::case::{Intent, TestCase};
use crate::classify::{Classification, Verdict};

/// Column names, in export order
pub const COLUMNS: [&str; 12] = [
    "Test Case ID",
    "Test Case Description",
    "Input Singlish Text",
    "Expected Output",
    "Actual Output",
    "Pass/Fail",
    "Comments",
    "Execution Time (ms)",
    "Input Type/Domain",
    "Sentence/Grammar Focus",
    "Input Length Type",
    "Quality Focus",
];

/// Stored in place of the output when the case faulted
pub const ERROR_OUTPUT: &str = "ERROR";

const NEGATIVE_EXPECTATION: &str = "Should fail or produce incorrect output";

/// One row of the report. Every intent produces the same fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "Test Case ID")]
    pub id: String,

    #[serde(rename = "Test Case Description")]
    pub description: String,

    #[serde(rename = "Input Singlish Text")]
    pub input: String,

    #[serde(rename = "Expected Output")]
    pub expected: String,

    #[serde(rename = "Actual Output")]
    pub actual: String,

    #[serde(rename = "Pass/Fail")]
    pub verdict: Verdict,

    #[serde(rename = "Comments")]
    pub comment: String,

    /// Wall time from before page navigation to the verdict, so page load
    /// is included along with submit and settle. Session setup is not.
    #[serde(rename = "Execution Time (ms)")]
    pub execution_ms: u64,

    #[serde(rename = "Input Type/Domain")]
    pub domain: String,

    #[serde(rename = "Sentence/Grammar Focus")]
    pub grammar: String,

    #[serde(rename = "Input Length Type")]
    pub length: String,

    #[serde(rename = "Quality Focus")]
    pub quality_focus: String,
}

impl ResultRecord {
    /// Record for a case that reached classification. `output` is the trimmed
    /// extracted text (the final output for real-time cases).
    pub fn completed(
        case: &TestCase,
        output: &str,
        classification: Classification,
        elapsed: Duration,
    ) -> Self {
        let actual = if output.is_empty() {
            empty_placeholder(case.intent).to_string()
        } else {
            output.to_string()
        };
        Self::build(case, actual, classification, elapsed)
    }

    /// Record for a case whose page interaction faulted
    pub fn errored(case: &TestCase, classification: Classification, elapsed: Duration) -> Self {
        Self::build(case, ERROR_OUTPUT.to_string(), classification, elapsed)
    }

    fn build(
        case: &TestCase,
        actual: String,
        classification: Classification,
        elapsed: Duration,
    ) -> Self {
        let expected = match case.intent {
            Intent::Negative => NEGATIVE_EXPECTATION.to_string(),
            _ => case.expected.clone(),
        };

        Self {
            id: case.id.clone(),
            description: case.description.clone(),
            input: case.input.clone(),
            expected,
            actual,
            verdict: classification.verdict,
            comment: classification.comment,
            execution_ms: elapsed.as_millis() as u64,
            domain: case.domain.clone(),
            grammar: case.grammar.clone(),
            length: case.length.code().to_string(),
            quality_focus: quality_focus(case.intent).to_string(),
        }
    }
}

fn empty_placeholder(intent: Intent) -> &'static str {
    match intent {
        Intent::Positive => "(Empty)",
        Intent::Negative => "(No output)",
        Intent::UiRealtime => "(UI behavior test)",
    }
}

fn quality_focus(intent: Intent) -> &'static str {
    match intent {
        Intent::Positive => "Accuracy validation",
        Intent::Negative => "Robustness validation",
        Intent::UiRealtime => "Real-time output update behavior",
    }
}

/// Append-only collection of records for one run.
///
/// Shared by reference between concurrently running cases; the lock is held
/// only for the push so appends never interleave.
#[derive(Debug, Default)]
pub struct ResultLog {
    records: Mutex<Vec<ResultRecord>>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: ResultRecord) {
        self.records.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copy of the records appended so far, in append order
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        self.records.lock().clone()
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records.into_inner()
    }
}
