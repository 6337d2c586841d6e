//! translit-check common library
//!
//! The browser-independent half of the harness:
//! - the test corpus and its case model
//! - target-script detection
//! - per-intent outcome classification
//! - result records, the run accumulator, and report export

pub mod case;
pub mod classify;
pub mod corpus;
pub mod error;
pub mod record;
pub mod report;
pub mod script;

pub use case::{Category, Intent, LengthClass, TestCase};
pub use classify::{Classification, Classifier, Evidence, Thresholds, UpdateTrace, Verdict};
pub use corpus::Corpus;
pub use error::{Error, Result};
pub use record::{ResultLog, ResultRecord};
pub use report::{summarize, Report, Summary};
pub use script::TargetScript;

/// translit-check version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
