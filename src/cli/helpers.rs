//! Shared helper functions for CLI commands.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::annotation::TokenRange;
use crate::api::BackendClient;
use crate::config::{Config, Settings};
use crate::storage::{GraphLayoutStore, JsonFileStore, KeyValueStore};

/// Everything a command needs: resolved paths, config, backend client and
/// the local store.
pub struct Context {
    pub settings: Settings,
    pub config: Config,
    pub client: BackendClient,
    store: Option<Arc<JsonFileStore>>,
}

impl Context {
    pub fn new(settings: Settings, config: Config) -> anyhow::Result<Self> {
        let client = BackendClient::new(&config.backend)?;
        Ok(Self {
            settings,
            config,
            client,
            store: None,
        })
    }

    /// Open the local store, creating the data directories on first use.
    pub fn store(&mut self) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        if let Some(ref store) = self.store {
            return Ok(store.clone());
        }
        self.settings.ensure_directories()?;
        let store = Arc::new(JsonFileStore::open(&self.settings.store_dir)?);
        self.store = Some(store.clone());
        Ok(store)
    }

    pub fn layouts(&mut self) -> anyhow::Result<GraphLayoutStore> {
        Ok(GraphLayoutStore::new(self.store()?))
    }
}

/// Spinner shown while waiting on the backend.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Truncate a string to at most `max` characters, adding "..." when cut.
pub fn truncate(s: &str, max: usize) -> String {
    let flat: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    if flat.chars().count() <= max {
        flat
    } else {
        let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse `key=value` pairs.
pub fn parse_vars(pairs: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| anyhow::anyhow!("expected key=value, got '{}'", pair))
        })
        .collect()
}

fn parse_index(part: &str, whole: &str) -> anyhow::Result<usize> {
    part.trim()
        .parse::<usize>()
        .map_err(|_| anyhow::anyhow!("invalid index '{}' in '{}'", part.trim(), whole))
}

/// Parse an inclusive token range written as `START:END` (or a single index).
pub fn parse_range(s: &str) -> anyhow::Result<TokenRange> {
    let (start, end) = match s.split_once(':') {
        Some((start, end)) => (parse_index(start, s)?, parse_index(end, s)?),
        None => {
            let index = parse_index(s, s)?;
            (index, index)
        }
    };
    TokenRange::try_new(start, end)
        .ok_or_else(|| anyhow::anyhow!("range start {} is after its end {}", start, end))
}

/// Parse a half-open character range `FROM:TO` of the document text.
pub fn parse_chars(s: &str) -> anyhow::Result<(usize, usize)> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("expected FROM:TO, got '{}'", s))?;
    let (from, to) = (parse_index(from, s)?, parse_index(to, s)?);
    if from >= to {
        anyhow::bail!("character range {}:{} selects nothing", from, to);
    }
    Ok((from, to))
}

/// Find a label by id or, failing that, by name (ignoring case).
pub fn find_label<'a, T>(
    labels: &'a [T],
    key: &str,
    id_of: impl Fn(&T) -> i64,
    name_of: impl Fn(&T) -> &str,
) -> anyhow::Result<&'a T> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        if let Some(label) = labels.iter().find(|l| id_of(l) == id) {
            return Ok(label);
        }
    }
    let lowered = key.to_lowercase();
    labels
        .iter()
        .find(|l| name_of(l).trim().to_lowercase() == lowered)
        .ok_or_else(|| anyhow::anyhow!("no label matches '{}'", key))
}
