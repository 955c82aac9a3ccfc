//! Locates or downloads a Chrome/Chromium binary, launches it with a
//! fingerprint-hardened profile, and injects the stealth JS strategies and
//! the chapter extractor both rely on before navigating anywhere.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

/// Realistic modern-Chrome identity string, shared between the HTTP client
/// (`host_session.rs`) and the browser launch args below so both layers
/// present the same fingerprint.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const WINDOWS_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
];
const MACOS_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/homebrew/bin/chromium",
];
const LINUX_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
];

/// Finds a Chrome/Chromium executable: `CHROMIUM_PATH` env var first, then a
/// short list of conventional install locations per OS, then `which`.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!(path = %path.display(), "using browser from CHROMIUM_PATH");
            return Ok(path);
        }
        warn!(path = %path.display(), "CHROMIUM_PATH points to a non-existent file");
    }

    let candidates = if cfg!(target_os = "windows") {
        WINDOWS_PATHS
    } else if cfg!(target_os = "macos") {
        MACOS_PATHS
    } else {
        LINUX_PATHS
    };

    for &path_str in candidates {
        let path = if path_str.contains('%') && cfg!(target_os = "windows") {
            PathBuf::from(expand_windows_env_vars(path_str))
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            info!(path = %path.display(), "found browser");
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!(path = %found, "found browser via which");
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    warn!("no Chrome/Chromium executable found, will download a managed browser");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Expands `%VAR%` tokens in a Windows path; leaves unknown or malformed
/// tokens untouched.
fn expand_windows_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }
        let mut var_name = String::new();
        let mut found_closing = false;
        for c in chars.by_ref() {
            if c == '%' {
                found_closing = true;
                break;
            }
            var_name.push(c);
        }
        match (found_closing, var_name.is_empty()) {
            (true, false) => match std::env::var(&var_name) {
                Ok(value) => result.push_str(&value),
                Err(_) => {
                    result.push('%');
                    result.push_str(&var_name);
                    result.push('%');
                }
            },
            (true, true) => result.push('%'),
            (false, _) => {
                result.push('%');
                result.push_str(&var_name);
            }
        }
    }

    result
}

/// Downloads a managed Chromium build into the platform cache directory.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("downloading managed Chromium browser");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| {
            let fallback = std::env::temp_dir().join("webnovel_extractor_cache");
            warn!(path = %fallback.display(), "no platform cache dir, using temp fallback");
            fallback
        })
        .join("webnovel_extractor")
        .join("chromium");

    std::fs::create_dir_all(&cache_dir).context("failed to create cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("failed to build fetcher options")?,
    );
    let revision_info = fetcher.fetch().await.context("failed to fetch browser")?;
    info!(path = %revision_info.folder_path.display(), "downloaded Chromium");

    Ok(revision_info.executable_path)
}

const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-notifications",
    "--disable-print-preview",
    "--disable-desktop-notifications",
    "--disable-software-rasterizer",
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process,TranslateUI",
    "--disable-setuid-sandbox",
    "--no-first-run",
    "--no-default-browser-check",
    "--no-sandbox",
    "--ignore-certificate-errors",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-component-extensions-with-background-pages",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-prompt-on-repost",
    "--metrics-recording-only",
    "--password-store=basic",
    "--use-mock-keychain",
    "--hide-scrollbars",
    "--mute-audio",
];

/// Finds or downloads Chrome, launches it with a fresh profile directory and
/// a hardened argument set, and spawns a task that drains the CDP event
/// handler for the browser's lifetime.
///
/// `chrome_data_dir` pins a caller-supplied profile directory; `None` mints
/// a fresh tempdir per launch so concurrent runs never collide on a lock
/// file.
pub async fn launch_browser(
    headless: bool,
    chrome_data_dir: Option<PathBuf>,
) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let chrome_path = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let user_data_dir = match chrome_data_dir {
        Some(dir) => dir,
        None => tempfile::Builder::new()
            .prefix("webnovel_extractor_chrome_")
            .tempdir()
            .context("failed to create browser profile tempdir")?
            .into_path(),
    };
    std::fs::create_dir_all(&user_data_dir).context("failed to create user data directory")?;

    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1920, 1080)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(chrome_path);

    config_builder = if headless {
        config_builder.headless_mode(HeadlessMode::default())
    } else {
        config_builder.with_head()
    };

    config_builder = config_builder.arg(format!("--user-agent={CHROME_USER_AGENT}"));
    for arg in STEALTH_ARGS {
        config_builder = config_builder.arg(*arg);
    }

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

    info!(?browser_config, "launching browser");
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let message = e.to_string();
                // chromiumoxide doesn't recognize every CDP event Chrome
                // sends; these two are known-benign deserialization misses.
                let benign = message.contains("data did not match any variant of untagged enum Message")
                    || message.contains("Failed to deserialize WS response");
                if benign {
                    trace!(%message, "suppressed benign CDP serialization error");
                } else {
                    error!(%message, "browser handler error");
                }
            }
        }
        info!("browser handler task completed");
    });

    Ok((browser, handler_task, user_data_dir))
}

/// Injects JS that removes the automation fingerprints a site-side detector
/// typically checks: `navigator.webdriver`, plugin/language lists, the
/// absence of `window.chrome`, and WebGL vendor/renderer strings.
pub async fn apply_stealth_measures(page: &chromiumoxide::Page) -> Result<()> {
    page.evaluate("Object.defineProperty(navigator, 'webdriver', { get: () => false });")
        .await?;

    page.evaluate(
        format!(
            "Object.defineProperty(navigator, 'userAgent', {{ value: '{CHROME_USER_AGENT}' }});"
        )
        .as_str(),
    )
    .await?;

    page.evaluate(
        "Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });",
    )
    .await?;

    page.evaluate(
        r"
        const mockPlugins = [
            { name: 'Chrome PDF Plugin', description: 'Portable Document Format', filename: 'internal-pdf-viewer', mimeTypes: [{ type: 'application/pdf', description: 'Portable Document Format' }] },
            { name: 'Chrome PDF Viewer', description: '', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', mimeTypes: [{ type: 'application/pdf', description: 'Portable Document Format' }] },
            { name: 'Native Client', description: '', filename: 'internal-nacl-plugin', mimeTypes: [] },
        ];
        const pluginsProto = Object.getPrototypeOf(navigator.plugins);
        Object.defineProperty(navigator, 'plugins', {
            get: () => {
                const plugins = {};
                mockPlugins.forEach((plugin, i) => {
                    plugins[i] = plugin;
                    plugins[plugin.name] = plugin;
                });
                Object.setPrototypeOf(plugins, pluginsProto);
                Object.defineProperty(plugins, 'length', { value: mockPlugins.length });
                return plugins;
            }
        });
        ",
    )
    .await?;

    page.evaluate(
        r"
        if (!window.chrome) { window.chrome = {}; }
        if (!window.chrome.runtime) {
            window.chrome.runtime = {
                connect: () => ({
                    onMessage: { addListener: () => {}, removeListener: () => {} },
                    postMessage: () => {}
                })
            };
        }
        ",
    )
    .await?;

    page.evaluate(
        r"
        const getParameterProxyHandler = {
            apply: function(target, ctx, args) {
                const param = (args && args[0]) || null;
                if (param === 37445) { return 'Intel Inc.'; }
                if (param === 37446) { return 'Intel Iris OpenGL Engine'; }
                return Reflect.apply(target, ctx, args);
            }
        };
        if (window.WebGLRenderingContext) {
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = new Proxy(getParameter, getParameterProxyHandler);
        }
        ",
    )
    .await?;

    Ok(())
}
