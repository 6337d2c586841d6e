//! In-memory page used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use translit_e2e::{E2eError, E2eResult, Element, PageDriver, SessionFactory};

type Render = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A page with a fixed set of selectors, one input and one output element.
/// The output text is computed from whatever was last filled in.
#[derive(Clone)]
pub struct FakePage {
    present: HashSet<String>,
    input_selector: String,
    output_selector: Option<String>,
    render: Render,
    body: Render,
    fail_on: Option<&'static str>,
    hang_on_wait: bool,
    hang_on_close: bool,
    value: Arc<Mutex<String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakePage {
    /// A page with a `textarea` input and a `.output` element
    pub fn new(render: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            present: ["textarea", ".output"].iter().map(|s| s.to_string()).collect(),
            input_selector: "textarea".to_string(),
            output_selector: Some(".output".to_string()),
            render: Arc::new(render),
            body: Arc::new(|_| "Singlish to Sinhala converter".to_string()),
            fail_on: None,
            hang_on_wait: false,
            hang_on_close: false,
            value: Arc::new(Mutex::new(String::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Page that echoes a fixed mapping table
    pub fn mapping(pairs: &[(&str, &str)]) -> Self {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        Self::new(move |input| {
            pairs
                .iter()
                .find(|(a, _)| a == input)
                .map(|(_, b)| b.clone())
                .unwrap_or_default()
        })
    }

    pub fn without_input(mut self) -> Self {
        self.present.remove(&self.input_selector);
        self
    }

    pub fn without_output(mut self) -> Self {
        if let Some(selector) = self.output_selector.take() {
            self.present.remove(&selector);
        }
        self
    }

    pub fn with_body(mut self, body: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.body = Arc::new(body);
        self
    }

    pub fn with_element(mut self, selector: &str) -> Self {
        self.present.insert(selector.to_string());
        self
    }

    pub fn failing_on(mut self, op: &'static str) -> Self {
        self.fail_on = Some(op);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang_on_wait = true;
        self
    }

    pub fn hanging_on_close(mut self) -> Self {
        self.hang_on_close = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) -> E2eResult<()> {
        let op = call.split(':').next().unwrap_or_default().to_string();
        self.calls.lock().push(call);
        if self.fail_on == Some(op.as_str()) {
            return Err(E2eError::Driver(format!("{op} failed: Target closed")));
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.record(format!("navigate:{url}"))
    }

    async fn wait_for_idle(&self) -> E2eResult<()> {
        self.record("idle".to_string())
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        self.record(format!("count:{selector}"))?;
        Ok(usize::from(self.present.contains(selector)))
    }

    async fn clear(&self, element: &Element) -> E2eResult<()> {
        self.record(format!("clear:{element}"))?;
        self.value.lock().clear();
        Ok(())
    }

    async fn fill(&self, element: &Element, text: &str) -> E2eResult<()> {
        self.record(format!("fill:{element}"))?;
        *self.value.lock() = text.to_string();
        Ok(())
    }

    async fn text_content(&self, element: &Element) -> E2eResult<Option<String>> {
        self.record(format!("text:{element}"))?;
        if self.output_selector.as_deref() == Some(element.selector()) {
            let value = self.value.lock().clone();
            Ok(Some((self.render)(&value)))
        } else {
            Ok(None)
        }
    }

    async fn page_text(&self, scope: &str) -> E2eResult<String> {
        self.record(format!("page:{scope}"))?;
        let value = self.value.lock().clone();
        Ok((self.body)(&value))
    }

    async fn wait(&self, duration: Duration) -> E2eResult<()> {
        self.record(format!("wait:{}", duration.as_millis()))?;
        if self.hang_on_wait {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        self.record("close".to_string())?;
        if self.hang_on_close {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Hands out clones of one page and counts sessions
pub struct FakeFactory {
    pub page: FakePage,
    pub opened: AtomicUsize,
    hang_on_open: bool,
}

impl FakeFactory {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            opened: AtomicUsize::new(0),
            hang_on_open: false,
        }
    }

    /// A factory whose sessions never finish opening
    pub fn hanging(page: FakePage) -> Self {
        Self {
            hang_on_open: true,
            ..Self::new(page)
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Driver = FakePage;

    async fn open(&self) -> E2eResult<FakePage> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_open {
            std::future::pending::<()>().await;
        }
        let mut page = self.page.clone();
        page.value = Arc::new(Mutex::new(String::new()));
        page.calls = Arc::new(Mutex::new(Vec::new()));
        Ok(page)
    }
}
