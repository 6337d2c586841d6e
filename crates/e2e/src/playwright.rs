//! Playwright browser automation
//!
//! Each session is a `node` process running a small bridge script that owns
//! one browser, one context and one page. Commands and replies travel as
//! newline-delimited JSON over the child's stdin/stdout:
//!
//! ```text
//! -> {"id":3,"op":"fill","selector":"textarea","text":"mama"}
//! <- {"id":3,"ok":true,"value":null}
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::config::BrowserConfig;
use crate::driver::{Element, PageDriver, SessionFactory};
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

let browser = null;
let page = null;

const handlers = {
  async launch(msg) {
    browser = await playwright[msg.browser].launch({ headless: msg.headless });
    const context = await browser.newContext({
      viewport: { width: msg.width, height: msg.height }
    });
    page = await context.newPage();
    return null;
  },
  async navigate(msg) { await page.goto(msg.url); return null; },
  async waitForIdle() { await page.waitForLoadState('networkidle'); return null; },
  async count(msg) { return await page.locator(msg.selector).count(); },
  async clear(msg) { await page.locator(msg.selector).first().clear(); return null; },
  async fill(msg) { await page.locator(msg.selector).first().fill(msg.text); return null; },
  async textContent(msg) { return await page.locator(msg.selector).first().textContent(); },
  async pageText(msg) { return (await page.textContent(msg.scope)) || ''; },
  async close() {
    if (browser) await browser.close();
    browser = null;
    return null;
  },
};

function reply(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

const rl = readline.createInterface({ input: process.stdin });
rl.on('line', async (line) => {
  let msg;
  try {
    msg = JSON.parse(line);
  } catch (error) {
    return;
  }
  const handler = handlers[msg.op];
  if (!handler) {
    reply({ id: msg.id, ok: false, error: 'unknown op ' + msg.op });
    return;
  }
  try {
    const value = await handler(msg);
    reply({ id: msg.id, ok: true, value: value === undefined ? null : value });
  } catch (error) {
    reply({ id: msg.id, ok: false, error: error.message });
  }
  if (msg.op === 'close') process.exit(0);
});
rl.on('close', async () => {
  if (browser) await browser.close();
  process.exit(0);
});
"#;

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum BridgeOp<'a> {
    Launch {
        browser: &'static str,
        headless: bool,
        width: u32,
        height: u32,
    },
    Navigate {
        url: &'a str,
    },
    WaitForIdle,
    Count {
        selector: &'a str,
    },
    Clear {
        selector: &'a str,
    },
    Fill {
        selector: &'a str,
        text: &'a str,
    },
    TextContent {
        selector: &'a str,
    },
    PageText {
        scope: &'a str,
    },
    Close,
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    #[serde(flatten)]
    op: BridgeOp<'a>,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

struct BridgeIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// One browser page driven through a Playwright bridge process
pub struct PlaywrightDriver {
    child: Mutex<Child>,
    io: Mutex<BridgeIo>,
    next_id: AtomicU64,
    // Keeps the staged bridge script alive for the life of the process
    _script_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    /// Spawn the bridge and open a browser page
    pub async fn launch(config: &BrowserConfig) -> E2eResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        debug!("Starting Playwright bridge: {}", script_path.display());

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .env("NODE_PATH", node_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Driver(format!("Failed to spawn {}: {}", config.node_binary, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Driver("Bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Driver("Bridge stdout unavailable".to_string()))?;

        let driver = Self {
            child: Mutex::new(child),
            io: Mutex::new(BridgeIo {
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicU64::new(1),
            _script_dir: script_dir,
        };

        driver
            .request(BridgeOp::Launch {
                browser: config.browser.as_str(),
                headless: config.headless,
                width: config.viewport_width,
                height: config.viewport_height,
            })
            .await?;

        Ok(driver)
    }

    async fn request(&self, op: BridgeOp<'_>) -> E2eResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::to_string(&BridgeRequest { id, op })?;

        let mut io = self.io.lock().await;
        trace!("Bridge request: {}", line);
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.write_all(b"\n").await?;
        io.stdin.flush().await?;

        // Skip anything that is not our reply
        loop {
            let Some(line) = io.stdout.next_line().await? else {
                return Err(E2eError::Driver("Playwright bridge exited".to_string()));
            };
            trace!("Bridge response: {}", line);

            let response: BridgeResponse = match serde_json::from_str(&line) {
                Ok(response) => response,
                Err(_) => {
                    debug!("Ignoring bridge output: {}", line);
                    continue;
                }
            };
            if response.id != id {
                warn!("Discarding stale bridge reply {} (waiting for {})", response.id, id);
                continue;
            }

            return if response.ok {
                Ok(response.value)
            } else {
                Err(E2eError::Driver(
                    response.error.unwrap_or_else(|| "unknown bridge error".to_string()),
                ))
            };
        }
    }

    async fn request_void(&self, op: BridgeOp<'_>) -> E2eResult<()> {
        self.request(op).await.map(|_| ())
    }

    /// Stop the bridge process, politely first
    async fn terminate(&self) {
        let mut child = self.child.lock().await;

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && tokio::time::timeout(Duration::from_millis(500), child.wait())
                    .await
                    .is_ok()
            {
                return;
            }
        }

        let _ = child.kill().await;
    }
}

/// NODE_PATH that lets the staged script resolve `playwright` from the working directory
fn node_path() -> String {
    let local = std::env::current_dir()
        .map(|dir| dir.join("node_modules").to_string_lossy().to_string())
        .unwrap_or_else(|_| "node_modules".to_string());
    match std::env::var("NODE_PATH") {
        Ok(existing) if !existing.is_empty() => format!("{local}:{existing}"),
        _ => local,
    }
}

#[async_trait]
impl PageDriver for PlaywrightDriver {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.request_void(BridgeOp::Navigate { url }).await
    }

    async fn wait_for_idle(&self) -> E2eResult<()> {
        self.request_void(BridgeOp::WaitForIdle).await
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        let value = self.request(BridgeOp::Count { selector }).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| E2eError::Driver(format!("count returned {value}")))
    }

    async fn clear(&self, element: &Element) -> E2eResult<()> {
        self.request_void(BridgeOp::Clear {
            selector: element.selector(),
        })
        .await
    }

    async fn fill(&self, element: &Element, text: &str) -> E2eResult<()> {
        self.request_void(BridgeOp::Fill {
            selector: element.selector(),
            text,
        })
        .await
    }

    async fn text_content(&self, element: &Element) -> E2eResult<Option<String>> {
        let value = self
            .request(BridgeOp::TextContent {
                selector: element.selector(),
            })
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn page_text(&self, scope: &str) -> E2eResult<String> {
        let value = self.request(BridgeOp::PageText { scope }).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn close(&self) -> E2eResult<()> {
        let result = self.request_void(BridgeOp::Close).await;
        self.terminate().await;
        result
    }
}

/// Launches a fresh Playwright session for every case
#[derive(Debug, Clone)]
pub struct PlaywrightLauncher {
    config: BrowserConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: BrowserConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }
}

#[async_trait]
impl SessionFactory for PlaywrightLauncher {
    type Driver = PlaywrightDriver;

    async fn open(&self) -> E2eResult<PlaywrightDriver> {
        PlaywrightDriver::launch(&self.config).await
    }
}
