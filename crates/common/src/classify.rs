//! Outcome classification
//!
//! Maps what was observed on the page to a [`Verdict`] and a comment. Each
//! intent has its own policy:
//!
//! - positive: pass when the output contains any target-script character.
//!   The literal expected string is never compared, so wording differences
//!   in the live system are tolerated (and wrong-but-script output passes).
//! - negative: pass when the system visibly did not convert the input
//!   (empty, echoed, too short, or mostly non-script).
//! - real-time: pass when the output changed at least twice while typing.
//!
//! Everything here is pure; the runner feeds it evidence.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::case::{Intent, TestCase};
use crate::script::TargetScript;

/// Judgment for one executed case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
    Partial,
    Error,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [Verdict::Pass, Verdict::Fail, Verdict::Partial, Verdict::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::Fail => "Fail",
            Verdict::Partial => "Partial",
            Verdict::Error => "Error",
        }
    }

    pub fn parse(s: &str) -> Option<Verdict> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the human-readable reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub comment: String,
}

impl Classification {
    fn new(verdict: Verdict, comment: impl Into<String>) -> Self {
        Self {
            verdict,
            comment: comment.into(),
        }
    }
}

/// Tunable policy constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Negative cases pass while the script ratio stays strictly below this
    pub negative_max_script_ratio: f64,

    /// Negative output shorter than this many characters counts as no output
    pub negative_min_length: usize,

    /// Distinct output changes needed for a real-time pass
    pub realtime_min_updates: usize,

    /// Characters of unexpected output quoted in a negative failure comment
    pub preview_chars: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            negative_max_script_ratio: 0.3,
            negative_min_length: 2,
            realtime_min_updates: 2,
            preview_chars: 30,
        }
    }
}

/// Output readings taken while a phrase was typed prefix by prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTrace {
    /// Trimmed output after each prefix was entered
    pub readings: Vec<String>,

    /// Trimmed output after the final settle delay
    pub final_output: String,
}

impl UpdateTrace {
    /// Number of readings that are non-empty and differ from the last non-empty reading
    pub fn distinct_changes(&self) -> usize {
        let mut previous = "";
        let mut changes = 0;
        for reading in &self.readings {
            if !reading.is_empty() && reading != previous {
                changes += 1;
                previous = reading.as_str();
            }
        }
        changes
    }
}

/// What the runner observed for a case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// Extracted output text (may be empty)
    Output(String),
    /// Incremental readings from a real-time case
    Updates(UpdateTrace),
}

/// Applies the per-intent policies against a target script
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    script: TargetScript,
    thresholds: Thresholds,
}

impl Classifier {
    pub fn new(script: TargetScript, thresholds: Thresholds) -> Self {
        Self { script, thresholds }
    }

    pub fn script(&self) -> &TargetScript {
        &self.script
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Dispatch on the case intent
    pub fn classify(&self, case: &TestCase, evidence: &Evidence) -> Classification {
        match (case.intent, evidence) {
            (Intent::Positive, Evidence::Output(output)) => self.positive(output),
            (Intent::Negative, Evidence::Output(output)) => self.negative(&case.input, output),
            (Intent::UiRealtime, Evidence::Updates(trace)) => self.realtime(trace),
            (intent, _) => Classification::new(
                Verdict::Error,
                format!("Evidence does not match {} intent", intent),
            ),
        }
    }

    pub fn positive(&self, output: &str) -> Classification {
        let output = output.trim();
        if output.is_empty() {
            return Classification::new(Verdict::Fail, "No output produced");
        }

        if self.script.appears_in(output) {
            Classification::new(
                Verdict::Pass,
                format!("Correct output generated ({} script detected)", self.script.name()),
            )
        } else {
            Classification::new(
                Verdict::Fail,
                format!("Output does not contain {} characters", self.script.name()),
            )
        }
    }

    pub fn negative(&self, input: &str, output: &str) -> Classification {
        let output = output.trim();
        let echoed = output == input || output == input.trim();

        if output.is_empty()
            || echoed
            || output.chars().count() < self.thresholds.negative_min_length
        {
            return Classification::new(Verdict::Pass, "System failed as expected (good)");
        }

        if self.script.ratio(output) < self.thresholds.negative_max_script_ratio {
            Classification::new(
                Verdict::Pass,
                format!(
                    "System produced minimal/non-{} output as expected",
                    self.script.name()
                ),
            )
        } else {
            let preview: String = output.chars().take(self.thresholds.preview_chars).collect();
            Classification::new(
                Verdict::Fail,
                format!("System produced {} output: \"{}...\"", self.script.name(), preview),
            )
        }
    }

    pub fn realtime(&self, trace: &UpdateTrace) -> Classification {
        let changes = trace.distinct_changes();
        if changes >= self.thresholds.realtime_min_updates {
            Classification::new(
                Verdict::Pass,
                format!("Real-time updates working ({} updates detected)", changes),
            )
        } else if !trace.final_output.trim().is_empty() {
            Classification::new(
                Verdict::Partial,
                "Output generated but limited real-time updates detected",
            )
        } else {
            Classification::new(Verdict::Fail, "No real-time updates detected")
        }
    }

    /// Classification for a case whose page interaction faulted.
    ///
    /// Negative cases cannot tell a site that rejected bad input by erroring
    /// from a harness fault, so a fault there counts as the expected failure.
    pub fn fault(&self, intent: Intent, message: &str) -> Classification {
        match intent {
            Intent::Positive => {
                Classification::new(Verdict::Error, format!("Test error: {}", message))
            }
            Intent::Negative => Classification::new(
                Verdict::Pass,
                format!("Execution error (expected): {}", message),
            ),
            Intent::UiRealtime => {
                Classification::new(Verdict::Error, format!("UI test error: {}", message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn classifier() -> Classifier {
        Classifier::default()
    }

    #[test]
    fn test_positive_sinhala_output_passes() {
        let c = classifier().positive("මම ගෙදර යනවා");
        assert_eq!(c.verdict, Verdict::Pass);
        assert!(c.comment.to_lowercase().contains("correct output"));
    }

    #[test]
    fn test_positive_ignores_expected_wording() {
        // Any script output passes, even if it is not the expected sentence.
        let c = classifier().positive("ඔයා");
        assert_eq!(c.verdict, Verdict::Pass);
    }

    #[test_case("" ; "empty")]
    #[test_case("   \n\t" ; "blank")]
    fn test_positive_empty_fails(output: &str) {
        let c = classifier().positive(output);
        assert_eq!(c.verdict, Verdict::Fail);
        assert_eq!(c.comment, "No output produced");
    }

    #[test]
    fn test_positive_latin_output_fails() {
        let c = classifier().positive("mama gedhara yanavaa");
        assert_eq!(c.verdict, Verdict::Fail);
        assert_eq!(c.comment, "Output does not contain Sinhala characters");
    }

    #[test_case("Hello how are you", "Hello how are you" ; "echoed input")]
    #[test_case("!@#$%^&*()", "" ; "empty output")]
    #[test_case("hari hari ", "hari hari" ; "echo of trimmed input")]
    #[test_case("mama", "m" ; "shorter than minimum")]
    fn test_negative_no_conversion_passes(input: &str, output: &str) {
        let c = classifier().negative(input, output);
        assert_eq!(c.verdict, Verdict::Pass);
        assert_eq!(c.comment, "System failed as expected (good)");
    }

    #[test]
    fn test_negative_mostly_latin_passes() {
        let c = classifier().negative("lamayi school yannee", "ලම school yannee");
        assert_eq!(c.verdict, Verdict::Pass);
        assert!(c.comment.contains("minimal/non-Sinhala"));
    }

    #[test]
    fn test_negative_ratio_boundary_is_strict() {
        // 3 of 10 characters: ratio exactly 0.3 fails
        let c = classifier().negative("input", "අආඇabcdefg");
        assert_eq!(c.verdict, Verdict::Fail);

        // 2 of 7 characters: ratio just under 0.3 passes
        let c = classifier().negative("input", "අආabcde");
        assert_eq!(c.verdict, Verdict::Pass);
    }

    #[test]
    fn test_negative_ratio_threshold_is_configurable() {
        let strict = Classifier::new(
            TargetScript::sinhala(),
            Thresholds {
                negative_max_script_ratio: 0.2999,
                ..Default::default()
            },
        );
        // 3 of 10 = 0.3 is above 0.2999
        assert_eq!(strict.negative("x", "අආඇabcdefg").verdict, Verdict::Fail);

        let loose = Classifier::new(
            TargetScript::sinhala(),
            Thresholds {
                negative_max_script_ratio: 0.3001,
                ..Default::default()
            },
        );
        assert_eq!(loose.negative("x", "අආඇabcdefg").verdict, Verdict::Pass);
    }

    #[test]
    fn test_negative_converted_output_fails_with_preview() {
        let output = "මම ගෙදර යනවා මම ගෙදර යනවා මම ගෙදර යනවා";
        let c = classifier().negative("mamagedharayanavaa", output);
        assert_eq!(c.verdict, Verdict::Fail);
        let preview: String = output.chars().take(30).collect();
        assert_eq!(c.comment, format!("System produced Sinhala output: \"{}...\"", preview));
    }

    fn trace(readings: &[&str], final_output: &str) -> UpdateTrace {
        UpdateTrace {
            readings: readings.iter().map(|s| s.to_string()).collect(),
            final_output: final_output.to_string(),
        }
    }

    #[test]
    fn test_distinct_changes() {
        assert_eq!(trace(&[], "").distinct_changes(), 0);
        assert_eq!(trace(&["", "", ""], "").distinct_changes(), 0);
        assert_eq!(trace(&["ම", "ම", "මම", "", "මම"], "").distinct_changes(), 2);
        assert_eq!(trace(&["a", "b", "a"], "").distinct_changes(), 3);
    }

    #[test]
    fn test_realtime_three_changes_passes() {
        let mut readings = vec![""; 20];
        readings[2] = "ම";
        readings[7] = "මම ගෙ";
        readings[14] = "මම ගෙදර ය";
        for r in readings.iter_mut().skip(15) {
            *r = "මම ගෙදර ය";
        }
        for r in readings.iter_mut().take(14).skip(8) {
            *r = "මම ගෙ";
        }
        for r in readings.iter_mut().take(7).skip(3) {
            *r = "ම";
        }
        let c = classifier().realtime(&trace(&readings, "මම ගෙදර යනවා"));
        assert_eq!(c.verdict, Verdict::Pass);
        assert_eq!(c.comment, "Real-time updates working (3 updates detected)");
    }

    #[test]
    fn test_realtime_partial_and_fail() {
        let c = classifier().realtime(&trace(&["", ""], "මම"));
        assert_eq!(c.verdict, Verdict::Partial);

        let c = classifier().realtime(&trace(&["", ""], "  "));
        assert_eq!(c.verdict, Verdict::Fail);
    }

    #[test]
    fn test_fault_policy_per_intent() {
        let c = classifier();
        assert_eq!(c.fault(Intent::Positive, "boom").verdict, Verdict::Error);
        assert_eq!(c.fault(Intent::UiRealtime, "boom").verdict, Verdict::Error);

        let negative = c.fault(Intent::Negative, "boom");
        assert_eq!(negative.verdict, Verdict::Pass);
        assert_eq!(negative.comment, "Execution error (expected): boom");
    }

    #[test]
    fn test_mismatched_evidence_is_error() {
        let case = crate::corpus::builtin().cases()[0].clone();
        let c = classifier().classify(&case, &Evidence::Updates(UpdateTrace::default()));
        assert_eq!(c.verdict, Verdict::Error);
    }
}
