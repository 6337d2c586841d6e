//! translit-check E2E runner
//!
//! Drives a live transliteration page through Playwright, feeds it the
//! corpus and classifies what comes back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Harness (per corpus)                    │
//! │    └── SessionFactory::open() -> PageDriver (per case)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CaseRunner (per case)                                      │
//! │    ├── locate(input selectors)        Idle -> Submitting    │
//! │    ├── clear + fill, settle           -> Observing          │
//! │    ├── OutputExtractor::extract()                           │
//! │    └── Classifier::classify()         -> Classified/Errored │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ResultLog -> summarize() / export() (translit-common)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod output;
pub mod playwright;
pub mod runner;

pub use config::RunnerConfig;
pub use driver::{Element, PageDriver, SessionFactory};
pub use error::{E2eError, E2eResult};
pub use extractor::{Extraction, ExtractionSource, OutputExtractor};
pub use runner::{CaseRunner, CaseState, Harness};
