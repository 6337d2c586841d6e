//! Output extraction
//!
//! Reads the rendered conversion from the first output selector holding
//! non-blank text. When none does, an optional whole-page scan looks for a
//! run of target-script characters in the body text. That scan is a
//! heuristic that only works because the output script is disjoint from the
//! Latin input; it can pick up unrelated script text elsewhere on the page.

use serde::Serialize;
use tracing::debug;

use translit_common::TargetScript;

use crate::driver::PageDriver;
use crate::error::E2eResult;
use crate::locator::locate;

/// Where the extracted text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "selector", rename_all = "snake_case")]
pub enum ExtractionSource {
    Selector(String),
    WholePage,
    None,
}

/// Output found for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Trimmed text, absent when nothing was found
    pub text: Option<String>,
    pub source: ExtractionSource,
}

impl Extraction {
    pub fn empty() -> Self {
        Self {
            text: None,
            source: ExtractionSource::None,
        }
    }

    /// Extracted text, or `""`
    pub fn as_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Selectors and fallback policy for reading output
#[derive(Debug, Clone)]
pub struct OutputExtractor<'a> {
    pub selectors: &'a [String],
    pub whole_page_fallback: bool,
    pub script: &'a TargetScript,
}

impl OutputExtractor<'_> {
    pub async fn extract<D: PageDriver + ?Sized>(&self, driver: &D) -> E2eResult<Extraction> {
        for selector in self.selectors {
            let Some(element) = locate(driver, std::slice::from_ref(selector)).await? else {
                continue;
            };

            let text = driver.text_content(&element).await?.unwrap_or_default();
            let text = text.trim();
            if !text.is_empty() {
                debug!("Output found via {}", selector);
                return Ok(Extraction {
                    text: Some(text.to_string()),
                    source: ExtractionSource::Selector(selector.clone()),
                });
            }
        }

        if self.whole_page_fallback {
            let page = driver.page_text("body").await?;
            if let Some(run) = self.script.find_run(&page) {
                debug!("Output found by whole-page {} scan", self.script.name());
                return Ok(Extraction {
                    text: Some(run.trim().to_string()),
                    source: ExtractionSource::WholePage,
                });
            }
        }

        Ok(Extraction::empty())
    }
}
