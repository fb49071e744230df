use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self as async_mpsc, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

static CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*\bclass\s*=\s*["'][^"']*\blogs-container\b[^>]*>"#)
        .expect("static container pattern")
});
static ELEMENT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b[^>]*?(/?)>").expect("static element tag pattern")
});
static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div[^>]*\bclass\s*=\s*["'][^"']*\blog-entry\b[^"']*["'][^>]*>(.*?)</div>"#)
        .expect("static entry pattern")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static tag pattern"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("static entity pattern")
});

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(StatusCode),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no logs container")]
    MissingContainer,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub enum LogSource {
    /// Base URL of the bot dashboard; lines come from `<base>/logs`.
    Http { base_url: String },
    /// The bot's own log file, of which the last `tail` lines are shown.
    File { path: PathBuf, tail: usize },
}

impl LogSource {
    pub fn describe(&self) -> String {
        match self {
            LogSource::Http { base_url } => logs_url(base_url),
            LogSource::File { path, tail } => format!("{} (last {})", path.display(), tail),
        }
    }
}

#[derive(Debug)]
pub enum SourceEvent {
    RefreshStarted,
    Fetched(Result<Vec<String>, FetchError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCommand {
    RefreshNow,
}

/// Typed body served by `/logs` when JSON is negotiated.
#[derive(Debug, Deserialize)]
struct LogsPayload {
    logs: Vec<String>,
}

/// Control side of the refresh worker. Dropping it stops the worker after
/// its current fetch.
pub struct SourceHandle {
    commands: UnboundedSender<SourceCommand>,
}

impl SourceHandle {
    /// Ask for an immediate refresh. Returns false if the worker is gone.
    pub fn request_refresh(&self) -> bool {
        self.commands.send(SourceCommand::RefreshNow).is_ok()
    }
}

/// Spawn the refresh worker. It fetches once immediately, then every
/// `period`, and on demand. At most one fetch is ever in flight: missed ticks
/// are skipped and requests that arrive during a fetch are dropped.
pub fn start_source(
    source: LogSource,
    period: Duration,
    tx: Sender<SourceEvent>,
) -> Result<SourceHandle> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build refresh runtime")?;
    let fetcher = Fetcher::new(source, period)?;
    let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();

    thread::Builder::new()
        .name("log-refresh".to_string())
        .spawn(move || runtime.block_on(run_refresh_loop(fetcher, period, tx, cmd_rx)))
        .context("Failed to spawn refresh worker")?;

    Ok(SourceHandle { commands: cmd_tx })
}

async fn run_refresh_loop(
    fetcher: Fetcher,
    period: Duration,
    tx: Sender<SourceEvent>,
    mut commands: UnboundedReceiver<SourceCommand>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            cmd = commands.recv() => match cmd {
                Some(SourceCommand::RefreshNow) => ticker.reset(),
                None => break,
            },
        }

        if tx.send(SourceEvent::RefreshStarted).is_err() {
            break;
        }
        let result = fetcher.fetch().await;
        let mut dropped = 0;
        while commands.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "ignored refresh requests made during fetch");
        }
        if tx.send(SourceEvent::Fetched(result)).is_err() {
            break;
        }
    }
    info!("refresh worker stopped");
}

enum Fetcher {
    Http { client: Client, url: String },
    File { path: PathBuf, tail: usize },
}

impl Fetcher {
    fn new(source: LogSource, period: Duration) -> Result<Self> {
        Ok(match source {
            LogSource::Http { base_url } => Fetcher::Http {
                // Bounded by the period so a hung request cannot block later ticks.
                client: Client::builder()
                    .timeout(period)
                    .build()
                    .context("Failed to build HTTP client")?,
                url: logs_url(&base_url),
            },
            LogSource::File { path, tail } => Fetcher::File { path, tail },
        })
    }

    async fn fetch(&self) -> Result<Vec<String>, FetchError> {
        match self {
            Fetcher::Http { client, url } => fetch_logs(client, url).await,
            Fetcher::File { path, tail } => {
                let content = tokio::fs::read_to_string(path).await?;
                Ok(tail_lines(&content, *tail))
            }
        }
    }
}

pub fn logs_url(base_url: &str) -> String {
    format!("{}/logs", base_url.trim_end_matches('/'))
}

/// One GET of the log endpoint. JSON bodies are decoded as `{"logs": [...]}`;
/// anything else is treated as the rendered logs page.
pub async fn fetch_logs(client: &Client, url: &str) -> Result<Vec<String>, FetchError> {
    let response = client
        .get(url)
        .header(ACCEPT, "application/json, text/html;q=0.9")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, url, "log endpoint returned an error status");
        return Err(FetchError::Status(status));
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));
    let body = response.text().await?;

    if is_json {
        let payload: LogsPayload = serde_json::from_str(&body)?;
        Ok(payload.logs)
    } else {
        parse_logs_fragment(&body)
    }
}

/// Extract the text of every `log-entry` element inside the `logs-container`
/// element. Markup inside an entry is stripped and character references
/// decoded, so the text matches what a browser would display.
///
/// Fails only when the container itself is missing; a container without
/// entries is an empty log.
pub fn parse_logs_fragment(html: &str) -> Result<Vec<String>, FetchError> {
    let container = container_body(html).ok_or(FetchError::MissingContainer)?;

    Ok(ENTRY
        .captures_iter(container)
        .filter_map(|caps| caps.get(1))
        .map(|inner| decode_entities(&TAG.replace_all(inner.as_str(), "")).trim().to_string())
        .collect())
}

/// Inner markup of the container element, up to its matching close tag. An
/// unclosed container runs to the end of the document.
fn container_body(html: &str) -> Option<&str> {
    let open = CONTAINER.captures(html)?;
    let name = open.get(1)?.as_str();
    let body_start = open.get(0)?.end();

    let mut depth = 1usize;
    for tag in ELEMENT_TAG.captures_iter(&html[body_start..]) {
        if !tag[2].eq_ignore_ascii_case(name) || !tag[3].is_empty() {
            continue;
        }
        if tag[1].is_empty() {
            depth += 1;
            continue;
        }
        depth -= 1;
        if depth == 0 {
            let end = body_start + tag.get(0)?.start();
            return Some(&html[body_start..end]);
        }
    }
    Some(&html[body_start..])
}

/// Decode named and numeric character references in one pass. Unknown names
/// and invalid code points are left as written.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let reference = &caps[1];
            let decoded = match reference.strip_prefix('#') {
                Some(num) => {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
                None => match reference {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "amp" => Some('&'),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                },
            };
            match decoded {
                Some('\u{a0}') => " ".to_string(),
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Last `tail` lines of `content`, oldest first.
pub fn tail_lines(content: &str, tail: usize) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let skip = lines.len().saturating_sub(tail);
    lines[skip..].iter().map(|l| l.to_string()).collect()
}
