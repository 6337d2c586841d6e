//! Page driver abstraction
//!
//! The runner only needs a handful of browser primitives. Anything that can
//! navigate, count selector matches, fill an element and read text can drive
//! a case; [`crate::playwright::PlaywrightDriver`] is the production one.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::E2eResult;

/// The first element matched by a selector, resolved lazily by the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    selector: String,
}

impl Element {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    /// An element matched by `selector` inside this one
    pub fn child(&self, selector: &str) -> Element {
        Element::new(format!("{} >> {}", self.selector, selector))
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)
    }
}

/// Browser primitives for one page session
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> E2eResult<()>;

    /// Wait until the page has no pending network activity
    async fn wait_for_idle(&self) -> E2eResult<()>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> E2eResult<usize>;

    async fn clear(&self, element: &Element) -> E2eResult<()>;

    /// Replace the element's value with `text`
    async fn fill(&self, element: &Element, text: &str) -> E2eResult<()>;

    /// Text content of the element; `None` when it has none
    async fn text_content(&self, element: &Element) -> E2eResult<Option<String>>;

    /// Text content of the first element matching `scope` (e.g. `body`)
    async fn page_text(&self, scope: &str) -> E2eResult<String>;

    async fn wait(&self, duration: Duration) -> E2eResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Release the session
    async fn close(&self) -> E2eResult<()> {
        Ok(())
    }
}

/// Opens an independent page session per case
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Driver: PageDriver + 'static;

    async fn open(&self) -> E2eResult<Self::Driver>;
}
