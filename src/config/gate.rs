// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Scan Configuration Gate
 * Per-scan-type enable/disable toggles read from an external store
 * © 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::registry::ScannerRegistry;
use crate::types::ScanType;

/// Value that switches a scan type off. Everything else leaves it on.
pub const DISABLED_VALUE: &str = "false";
pub const ENABLED_VALUE: &str = "true";

/// Decide whether `scan_type` may run given the stored value of its toggle.
///
/// Absent entries allow the scan; only the exact string `"false"` denies it.
pub fn resolve(scan_type: ScanType, stored: Option<&str>) -> bool {
    let allowed = stored != Some(DISABLED_VALUE);
    if !allowed {
        debug!("Scan type {} disabled by config entry", scan_type);
    }
    allowed
}

/// Externally owned key/value store backing the gate
#[async_trait]
pub trait ScanConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn entries(&self) -> Result<HashMap<String, String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store, last writer wins
#[derive(Default)]
pub struct InMemoryConfigStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }
}

#[async_trait]
impl ScanConfigStore for InMemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn entries(&self) -> Result<HashMap<String, String>> {
        Ok(self.entries.read().clone())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object file, re-read on every lookup so changes made by another
/// process are seen by the next dispatch
pub struct JsonFileConfigStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", self.path));
            }
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        let raw: HashMap<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid scan config file {:?}", self.path))?;

        Ok(raw
            .into_iter()
            .map(|(k, v)| (k, stored_value(&v)))
            .collect())
    }
}

#[async_trait]
impl ScanConfigStore for JsonFileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn entries(&self) -> Result<HashMap<String, String>> {
        self.load().await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries: BTreeMap<String, String> = self.load().await?.into_iter().collect();
        entries.insert(key.to_string(), value.to_string());

        let rendered = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, rendered)
            .await
            .with_context(|| format!("Failed to write {:?}", self.path))?;

        Ok(())
    }
}

/// Render a JSON value the way toggles are stored: lowercase text
fn stored_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

/// Gate consulted by the dispatcher before every scan
#[derive(Clone)]
pub struct ScanGate {
    store: Arc<dyn ScanConfigStore>,
}

impl ScanGate {
    pub fn new(store: Arc<dyn ScanConfigStore>) -> Self {
        Self { store }
    }

    /// Gate over an empty in-memory store: every scan type allowed
    pub fn allow_all() -> Self {
        Self::new(Arc::new(InMemoryConfigStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn ScanConfigStore> {
        &self.store
    }

    /// Reads the store on every call
    pub async fn is_enabled(&self, scan_type: ScanType) -> Result<bool> {
        let stored = self.store.get(&scan_type.config_key()).await?;
        Ok(resolve(scan_type, stored.as_deref()))
    }

    /// Enabled state of every registered scan type
    pub async fn snapshot(&self, registry: &ScannerRegistry) -> Result<BTreeMap<ScanType, bool>> {
        let entries = self.store.entries().await?;

        Ok(registry
            .scan_types()
            .into_iter()
            .map(|scan_type| {
                let stored = entries.get(&scan_type.config_key()).map(String::as_str);
                (scan_type, resolve(scan_type, stored))
            })
            .collect())
    }

    /// Stored entries merged over the all-enabled defaults
    pub async fn effective_config(
        &self,
        registry: &ScannerRegistry,
    ) -> Result<BTreeMap<String, String>> {
        let mut merged: BTreeMap<String, String> = registry
            .scan_types()
            .into_iter()
            .map(|scan_type| (scan_type.config_key(), ENABLED_VALUE.to_string()))
            .collect();

        merged.extend(self.store.entries().await?);
        Ok(merged)
    }

    /// Store each update with its value lowercased
    pub async fn apply_updates(&self, updates: &HashMap<String, Value>) -> Result<()> {
        for (key, value) in updates {
            let value = stored_value(value);
            info!(key = %key, value = %value, "Updating scan config entry");
            self.store.set(key, &value).await?;
        }
        Ok(())
    }

    pub async fn set_enabled(&self, scan_type: ScanType, enabled: bool) -> Result<()> {
        let value = if enabled { ENABLED_VALUE } else { DISABLED_VALUE };
        self.store.set(&scan_type.config_key(), value).await
    }
}
