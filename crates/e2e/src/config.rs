//! Runner configuration
//!
//! Loaded from an optional TOML file; every field has a default so a partial
//! file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use translit_common::{Intent, Thresholds};

use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;

/// Full runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Page under test
    pub base_url: String,

    /// Directory for the CSV and JSON reports
    pub output_dir: PathBuf,
    pub csv_file: String,
    pub json_file: String,

    /// Cases executed at once, each in its own browser session
    pub concurrency: usize,

    /// Upper bound on one case, including opening its session; elapsing
    /// it records an Error
    pub case_timeout_ms: u64,

    /// Upper bound on closing a session; on expiry the driver is dropped
    pub session_close_timeout_ms: u64,

    pub settle: SettleConfig,
    pub selectors: SelectorConfig,
    pub thresholds: Thresholds,
    pub browser: BrowserConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.swifttranslator.com/".to_string(),
            output_dir: PathBuf::from("test-results"),
            csv_file: "test-results.csv".to_string(),
            json_file: "test-results.json".to_string(),
            concurrency: 1,
            case_timeout_ms: 60_000,
            session_close_timeout_ms: 5_000,
            settle: SettleConfig::default(),
            selectors: SelectorConfig::default(),
            thresholds: Thresholds::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.concurrency == 0 {
            return Err(E2eError::Config("concurrency must be at least 1".to_string()));
        }
        for (name, set) in [
            ("positive", &self.selectors.positive),
            ("negative", &self.selectors.negative),
            ("realtime", &self.selectors.realtime),
        ] {
            if set.input.is_empty() {
                return Err(E2eError::Config(format!("selectors.{name}.input is empty")));
            }
        }
        if !(0.0..=1.0).contains(&self.thresholds.negative_max_script_ratio) {
            return Err(E2eError::Config(
                "thresholds.negative_max_script_ratio must be within 0..=1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(&self.json_file)
    }

    pub fn case_timeout(&self) -> Duration {
        Duration::from_millis(self.case_timeout_ms)
    }

    pub fn session_close_timeout(&self) -> Duration {
        Duration::from_millis(self.session_close_timeout_ms)
    }

    pub fn selectors_for(&self, intent: Intent) -> &SelectorSet {
        match intent {
            Intent::Positive => &self.selectors.positive,
            Intent::Negative => &self.selectors.negative,
            Intent::UiRealtime => &self.selectors.realtime,
        }
    }
}

/// How the runner waits for asynchronous rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    /// Blind delay of the per-intent duration
    #[default]
    Fixed,
    /// Re-read the output until two consecutive reads agree
    Poll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    pub mode: SettleMode,
    pub positive_ms: u64,
    pub negative_ms: u64,
    pub realtime_step_ms: u64,
    pub realtime_clear_ms: u64,
    pub realtime_final_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            mode: SettleMode::Fixed,
            positive_ms: 1500,
            negative_ms: 2000,
            realtime_step_ms: 300,
            realtime_clear_ms: 500,
            realtime_final_ms: 1000,
            poll_interval_ms: 250,
            poll_timeout_ms: 5000,
        }
    }
}

impl SettleConfig {
    /// Delay after submitting a functional case
    pub fn after_submit(&self, intent: Intent) -> Duration {
        let ms = match intent {
            Intent::Positive => self.positive_ms,
            Intent::Negative => self.negative_ms,
            Intent::UiRealtime => self.realtime_step_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Candidate selectors for one intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub input: Vec<String>,
    pub output: Vec<String>,
    #[serde(default)]
    pub whole_page_fallback: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub positive: SelectorSet,
    pub negative: SelectorSet,
    pub realtime: SelectorSet,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let short_inputs = ["input[type=\"text\"]", "textarea", "[contenteditable=\"true\"]"];

        Self {
            positive: SelectorSet {
                input: strings(&[
                    "input[type=\"text\"]",
                    "textarea",
                    "[contenteditable=\"true\"]",
                    "input",
                    "#input",
                    ".input",
                ]),
                output: strings(&[
                    ".output",
                    ".result",
                    ".translation",
                    "#output",
                    "#result",
                    "div:has-text(\"සිංහල\")",
                    "div:has-text(\"මම\")",
                    "textarea:not([type])",
                    "[class*=\"output\"]",
                    "[class*=\"result\"]",
                ]),
                whole_page_fallback: true,
            },
            negative: SelectorSet {
                input: strings(&short_inputs),
                output: strings(&[".output", ".result", ".translation", "#output", "#result"]),
                whole_page_fallback: false,
            },
            realtime: SelectorSet {
                input: strings(&short_inputs),
                output: strings(&[".output", ".result", ".translation"]),
                whole_page_fallback: false,
            },
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Node executable used to host the Playwright bridge
    pub node_binary: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: "node".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settle.after_submit(Intent::Positive), Duration::from_millis(1500));
        assert_eq!(config.settle.after_submit(Intent::Negative), Duration::from_millis(2000));
        assert_eq!(config.session_close_timeout(), Duration::from_millis(5000));
        assert_eq!(config.selectors.positive.input.len(), 6);
        assert_eq!(config.selectors.positive.output.len(), 10);
        assert!(config.selectors.positive.whole_page_fallback);
        assert!(!config.selectors_for(Intent::Negative).whole_page_fallback);
        assert_eq!(config.csv_path(), PathBuf::from("test-results/test-results.csv"));
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = RunnerConfig::from_toml(
            r##"
base_url = "http://127.0.0.1:3000/"
concurrency = 4

[settle]
mode = "poll"
positive_ms = 800

[thresholds]
negative_max_script_ratio = 0.5

[selectors.negative]
input = ["#source"]
output = ["#target"]

[browser]
browser = "firefox"
"##,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:3000/");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.settle.mode, SettleMode::Poll);
        assert_eq!(config.settle.positive_ms, 800);
        assert_eq!(config.settle.negative_ms, 2000);
        assert_eq!(config.thresholds.negative_max_script_ratio, 0.5);
        assert_eq!(config.thresholds.negative_min_length, 2);
        assert_eq!(config.selectors.negative.input, vec!["#source".to_string()]);
        assert!(!config.selectors.negative.whole_page_fallback);
        assert_eq!(config.selectors.positive.input.len(), 6);
        assert!(matches!(config.browser.browser, Browser::Firefox));
    }

    #[test_case("concurrency = 0" ; "zero concurrency")]
    #[test_case("[thresholds]\nnegative_max_script_ratio = 1.5" ; "ratio above one")]
    #[test_case("[selectors.realtime]\ninput = []\noutput = [\".output\"]" ; "empty inputs")]
    fn test_rejects_invalid(toml: &str) {
        assert!(matches!(RunnerConfig::from_toml(toml), Err(E2eError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = RunnerConfig::load(Path::new("/nonexistent/translit.toml")).unwrap();
        assert_eq!(config.concurrency, 1);
    }
}
