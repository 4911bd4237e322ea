// src/browser.rs
//
// One owned browser session per worker. The session wraps a dedicated
// Chromium instance plus the page showing the dashboard, and exposes the
// small capability surface the navigator needs: presence waits, element
// lookup, script-forced clicks, and panel HTML extraction. Callers must
// `close()` the session on every exit path; dropping it leaks the child
// process.
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::warn;

use crate::config::Config;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Outcome of a bounded presence wait. A timeout is an expected state the
/// caller handles with its own fallback, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
}

pub struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl Session {
    /// Launch a dedicated Chromium instance and open the dashboard in a
    /// fresh page.
    pub async fn launch(config: &Config) -> Result<Self> {
        let mut builder = BrowserConfig::builder().window_size(1920, 1080);
        if config.headful {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(|err| anyhow!(err))?;

        let (browser, mut cdp_events) = Browser::launch(browser_config)
            .await
            .context("launching Chromium")?;

        // The handler stream must be polled for the whole session or every
        // CDP call stalls.
        let handler = tokio::spawn(async move {
            while let Some(event) = cdp_events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page(config.base_url.as_str())
            .await
            .with_context(|| format!("opening {}", config.base_url))?;

        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    /// Poll until at least one element matches `xpath`, or the timeout
    /// passes.
    pub async fn wait_for(&self, xpath: &str, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self
                .page
                .find_xpaths(xpath)
                .await
                .map(|elements| !elements.is_empty())
                .unwrap_or(false);
            if found {
                return WaitOutcome::Ready;
            }
            if Instant::now() >= deadline {
                return WaitOutcome::TimedOut;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for presence, then return whatever matches right now, possibly
    /// nothing. Lookup failures degrade to an empty list.
    pub async fn wait_all(&self, xpath: &str, timeout: Duration) -> Vec<Element> {
        let _ = self.wait_for(xpath, timeout).await;
        self.page.find_xpaths(xpath).await.unwrap_or_default()
    }

    /// First element matching `xpath`, failing once the deadline passes.
    /// For controls that must exist for the run to make sense.
    pub async fn find_first(&self, xpath: &str, timeout: Duration) -> Result<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(mut elements) = self.page.find_xpaths(xpath).await {
                if !elements.is_empty() {
                    return Ok(elements.remove(0));
                }
            }
            if Instant::now() >= deadline {
                bail!("no element matched `{xpath}` within {timeout:?}");
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Click through script rather than synthesized input, which goes
    /// through even when an overlay sits above the element.
    pub async fn forced_click(&self, element: &Element) -> Result<()> {
        element
            .call_js_fn("function() { this.click(); }", false)
            .await
            .context("script-forced click")?;
        Ok(())
    }

    /// `outerHTML` of the first element matching a CSS selector, or `None`
    /// when nothing matches.
    pub async fn element_html(&self, css: &str) -> Result<Option<String>> {
        let expression = format!(
            "(() => {{ const el = document.querySelector({:?}); return el ? el.outerHTML : null; }})()",
            css
        );
        let evaluated = self
            .page
            .evaluate(expression)
            .await
            .with_context(|| format!("reading HTML for `{css}`"))?;
        Ok(evaluated.into_value::<Option<String>>().unwrap_or(None))
    }

    /// Close the page's browser and reap the child process.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}
