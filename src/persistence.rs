// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Record Persistence
 * Write-once scan records, sinks and the audited scan service
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dispatcher::ScanDispatcher;
use crate::types::{ScanRequest, ScanResult};

/// One completed scan as handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub target: String,
    pub scan_type: String,
    /// The result envelope as JSON text
    pub result: String,
    pub requester: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(request: &ScanRequest, result: &ScanResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: request.target.clone(),
            scan_type: request.scan_type.clone(),
            result: result.to_json(),
            requester: request.requester.clone(),
            created_at: Utc::now(),
        }
    }

    /// Envelope parsed back from its stored text
    pub fn envelope(&self) -> Result<ScanResult> {
        serde_json::from_str(&self.result).context("Stored scan result is not a JSON object")
    }
}

#[async_trait]
pub trait ScanSink: Send + Sync {
    async fn record(&self, record: &ScanRecord) -> Result<()>;
}

/// Keeps records in memory; used by tests and embedding callers
#[derive(Default)]
pub struct InMemoryScanSink {
    records: RwLock<Vec<ScanRecord>>,
}

impl InMemoryScanSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ScanRecord> {
        self.records.read().clone()
    }

    /// Number of stored records per scan type
    pub fn counts_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.read().iter() {
            *counts.entry(record.scan_type.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait]
impl ScanSink for InMemoryScanSink {
    async fn record(&self, record: &ScanRecord) -> Result<()> {
        self.records.write().push(record.clone());
        Ok(())
    }
}

/// Appends one JSON document per line
pub struct JsonlScanSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlScanSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record, skipping malformed lines
    pub async fn read_all(&self) -> Result<Vec<ScanRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        let mut records = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => debug!("Skipping malformed scan record: {}", e),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl ScanSink for JsonlScanSink {
    async fn record(&self, record: &ScanRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open scan log {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Caller-side composition: dispatch, persist, audit
pub struct ScanService<S: ScanSink> {
    dispatcher: ScanDispatcher,
    sink: S,
}

impl<S: ScanSink> ScanService<S> {
    pub fn new(dispatcher: ScanDispatcher, sink: S) -> Self {
        Self { dispatcher, sink }
    }

    pub fn dispatcher(&self) -> &ScanDispatcher {
        &self.dispatcher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run a scan and store its record. Rejected requests are not stored;
    /// a failed store is an error even though the scan itself completed.
    pub async fn run(&self, request: &ScanRequest) -> Result<(ScanRecord, ScanResult)> {
        let result = self.dispatcher.dispatch(request).await?;

        let record = ScanRecord::new(request, &result);
        self.sink
            .record(&record)
            .await
            .context("Failed to persist scan record")?;

        info!(
            target: "audit",
            event = "scan.completed",
            record_id = %record.id,
            requester = record.requester.as_deref().unwrap_or("anonymous"),
            scan_type = %record.scan_type,
            scan_target = %record.target,
            success = !result.is_error(),
        );

        Ok((record, result))
    }
}
