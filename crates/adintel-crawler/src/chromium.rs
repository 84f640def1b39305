//! Chromium driver via `chromiumoxide`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use adintel_core::AppConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::browser::{BrowserEngine, PageContext};
use crate::dom::DomSnapshot;
use crate::error::CrawlerError;

/// Serializes the live DOM into the flat, pre-ordered node list read by
/// [`DomSnapshot::from_json`]. Anchor hrefs are made absolute and boxes are
/// in document coordinates.
const SNAPSHOT_SCRIPT: &str = r"(() => {
  const SKIP = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
  const nodes = [];
  const stack = [[document.documentElement, null]];
  while (stack.length > 0) {
    const [el, parent] = stack.pop();
    if (SKIP.has(el.tagName.toUpperCase())) continue;
    const idx = nodes.length;
    let text = '';
    for (const child of el.childNodes) {
      if (child.nodeType === 3) text += ' ' + child.textContent;
    }
    const attrs = [];
    for (const attr of el.attributes) {
      const value = attr.name === 'href' && typeof el.href === 'string' ? el.href : attr.value;
      attrs.push([attr.name, value]);
    }
    const r = el.getBoundingClientRect();
    nodes.push({
      tag: el.tagName.toLowerCase(),
      attrs,
      text,
      rect: [r.x + window.scrollX, r.y + window.scrollY, r.width, r.height],
      parent,
    });
    for (let i = el.children.length - 1; i >= 0; i--) stack.push([el.children[i], idx]);
  }
  return { nodes };
})()";

const SCROLL_SCRIPT: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

/// Function expression taking the label list; clicks the first visible match.
const CLICK_BY_LABEL_FN: &str = r#"((labels) => {
  const wanted = labels.map((l) => l.toLowerCase());
  const candidates = document.querySelectorAll('button, [role="button"], a, span, div[aria-label]');
  for (const el of candidates) {
    const text = (el.innerText || el.textContent || '').trim().toLowerCase();
    const aria = (el.getAttribute('aria-label') || '').trim().toLowerCase();
    if (!wanted.includes(text) && !wanted.includes(aria)) continue;
    if (el.offsetParent === null) continue;
    el.click();
    return true;
  }
  return false;
})"#;

/// Locate a Chromium binary: explicit path first, then `PATH`, then the
/// standard macOS install location.
#[must_use]
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
    pub nav_timeout: Duration,
}

impl BrowserSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            chromium_path: config.chromium_path.clone(),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            nav_timeout: config.nav_timeout(),
        }
    }
}

pub struct ChromiumEngine {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    active: Arc<AtomicUsize>,
}

impl ChromiumEngine {
    /// Launch a browser process.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::BrowserNotFound`] when no binary can be
    /// located and [`CrawlerError::BrowserLaunch`] when it fails to start.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, CrawlerError> {
        let chrome_path =
            find_chromium(settings.chromium_path.as_deref()).ok_or(CrawlerError::BrowserNotFound)?;

        let mut builder = BrowserConfig::builder()
            .with_head()
            .chrome_executable(&chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--window-size=1366,900")
            .arg(format!("--user-agent={}", settings.user_agent))
            .request_timeout(settings.nav_timeout);
        if settings.headless {
            builder = builder.arg("--headless=new");
        }
        let config = builder.build().map_err(CrawlerError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlerError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler event error");
                }
            }
        });

        tracing::info!(path = %chrome_path.display(), headless = settings.headless, "browser launched");

        Ok(Self {
            browser: Arc::new(browser),
            handler,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[must_use]
    pub fn active_contexts(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Close the browser process and stop the event handler.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::BrowserLaunch`] if the browser refuses to
    /// close or a page context is still open.
    pub async fn shutdown(self) -> Result<(), CrawlerError> {
        let closed = match Arc::try_unwrap(self.browser) {
            Ok(mut browser) => browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| CrawlerError::BrowserLaunch(e.to_string())),
            Err(_) => Err(CrawlerError::BrowserLaunch(
                "page contexts still open at shutdown".to_string(),
            )),
        };
        self.handler.abort();
        closed
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn open_context(&self) -> Result<Box<dyn PageContext>, CrawlerError> {
        Ok(Box::new(self.open_page().await?))
    }
}

impl ChromiumEngine {
    /// Open a tab in a fresh browser context, so cookies, consent state and
    /// storage never leak between crawls.
    async fn open_page(&self) -> Result<ChromiumPage, CrawlerError> {
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| CrawlerError::ContextOpen(e.to_string()))?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(CrawlerError::ContextOpen)?;
        let page = match self.browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                dispose_context(&self.browser, context_id).await;
                return Err(CrawlerError::ContextOpen(e.to_string()));
            }
        };

        self.active.fetch_add(1, Ordering::Relaxed);
        Ok(ChromiumPage {
            page,
            context_id,
            browser: Arc::clone(&self.browser),
            active: Arc::clone(&self.active),
        })
    }
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        tracing::debug!(error = %e, "failed to dispose browser context");
    }
}

struct ChromiumPage {
    page: Page,
    context_id: BrowserContextId,
    browser: Arc<Browser>,
    active: Arc<AtomicUsize>,
}

impl ChromiumPage {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, CrawlerError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| CrawlerError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| CrawlerError::Script(e.to_string()))
    }
}

#[async_trait]
impl PageContext for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), CrawlerError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(CrawlerError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(CrawlerError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    async fn snapshot(&mut self) -> Result<DomSnapshot, CrawlerError> {
        let value: serde_json::Value = self.eval(SNAPSHOT_SCRIPT).await?;
        DomSnapshot::from_json(value)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), CrawlerError> {
        let _: bool = self.eval(SCROLL_SCRIPT).await?;
        Ok(())
    }

    async fn click_by_label(&mut self, labels: &[&str]) -> Result<bool, CrawlerError> {
        let labels_json = serde_json::to_string(labels)?;
        self.eval(&format!("{CLICK_BY_LABEL_FN}({labels_json})")).await
    }

    async fn close(self: Box<Self>) -> Result<(), CrawlerError> {
        let Self {
            page,
            context_id,
            browser,
            active,
        } = *self;
        active.fetch_sub(1, Ordering::Relaxed);
        let closed = page
            .close()
            .await
            .map_err(|e| CrawlerError::Script(e.to_string()));
        dispose_context(&browser, context_id).await;
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_path_is_not_found() {
        let missing = Path::new("/nonexistent/adintel/chrome");
        assert!(find_chromium(Some(missing)).is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn chromium_snapshot_round_trip() {
        let settings = BrowserSettings {
            chromium_path: None,
            headless: true,
            user_agent: adintel_core::config::DEFAULT_USER_AGENT.to_string(),
            nav_timeout: Duration::from_secs(15),
        };
        let engine = ChromiumEngine::launch(&settings)
            .await
            .expect("failed to launch browser");
        let mut ctx = engine.open_context().await.expect("failed to open context");

        ctx.navigate(
            "data:text/html,<div role=\"article\"><a href=\"/x\">See more</a><img src=\"a.png\"></div>",
            Duration::from_secs(15),
        )
        .await
        .expect("navigation failed");

        let snap = ctx.snapshot().await.expect("snapshot failed");
        assert_eq!(snap.node(snap.root()).tag, "html");
        assert!(snap.ids().any(|n| snap.node(n).role() == Some("article")));
        assert!(ctx
            .click_by_label(&["see more"])
            .await
            .expect("click failed"));

        ctx.close().await.expect("close failed");
        assert_eq!(engine.active_contexts(), 0);
        engine.shutdown().await.expect("shutdown failed");
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn each_page_gets_its_own_disposable_context() {
        use chromiumoxide::cdp::browser_protocol::target::GetBrowserContextsParams;

        let settings = BrowserSettings {
            chromium_path: None,
            headless: true,
            user_agent: adintel_core::config::DEFAULT_USER_AGENT.to_string(),
            nav_timeout: Duration::from_secs(15),
        };
        let engine = ChromiumEngine::launch(&settings)
            .await
            .expect("failed to launch browser");

        let first = engine.open_page().await.expect("failed to open first page");
        let second = engine.open_page().await.expect("failed to open second page");
        assert_ne!(first.context_id, second.context_id);
        let ids = [first.context_id.clone(), second.context_id.clone()];

        Box::new(first).close().await.expect("close failed");
        Box::new(second).close().await.expect("close failed");

        let live = engine
            .browser
            .execute(GetBrowserContextsParams::default())
            .await
            .expect("failed to list contexts")
            .result
            .browser_context_ids;
        assert!(ids.iter().all(|id| !live.contains(id)));
        engine.shutdown().await.expect("shutdown failed");
    }
}
