// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::process::{check_target_arg, resolve_binary, run_tool, ScratchSpace};
use super::Scanner;
use crate::errors::ScanFailure;
use crate::types::{ScanData, ScanOutcome, ScanType};

const TOOL: &str = "Sherlock";

pub const NO_ACCOUNTS_MESSAGE: &str = "No accounts found or file not created";

#[derive(Debug, Deserialize)]
struct SherlockRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url_user: Option<String>,
}

/// Username search across social sites through sherlock
pub struct SherlockScanner {
    binary: String,
    scratch_root: PathBuf,
    timeout: Duration,
}

impl SherlockScanner {
    pub fn new(binary: impl Into<String>, scratch_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            scratch_root: scratch_root.into(),
            timeout,
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), ScanFailure> {
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(ScanFailure::InvalidTarget(
            "Invalid username (no spaces allowed)".to_string(),
        ));
    }
    if username.contains(['/', '\\']) || username == "." || username == ".." {
        return Err(ScanFailure::InvalidTarget(
            "Invalid username (path separators not allowed)".to_string(),
        ));
    }
    check_target_arg(TOOL, username)
}

/// Map site name to profile URL from a sherlock CSV report. Rows missing
/// either column are skipped.
pub fn parse_report(content: &str) -> ScanData {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut found = ScanData::new();
    for row in reader.deserialize::<SherlockRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!("Skipping malformed sherlock row: {}", e);
                continue;
            }
        };

        if let (Some(site), Some(url)) = (row.name, row.url_user) {
            if !site.is_empty() && !url.is_empty() {
                found.insert(site, Value::String(url));
            }
        }
    }

    found
}

async fn read_report(path: &Path) -> Result<Option<String>, ScanFailure> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Scanner for SherlockScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::Sherlock
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let username = target.trim();
        validate_username(username)?;

        let binary = resolve_binary(TOOL, &self.binary)?;
        let scratch = ScratchSpace::create(&self.scratch_root, "sherlock_")?;

        info!("Searching accounts for username {}", username);
        let args = [
            OsStr::new(username),
            OsStr::new("--timeout"),
            OsStr::new("1"),
            OsStr::new("--no-color"),
            OsStr::new("--csv"),
            OsStr::new("--folderoutput"),
            scratch.path().as_os_str(),
        ];
        let output = run_tool(TOOL, &binary, args, self.timeout).await?;

        let report = read_report(&scratch.file(&format!("{}.csv", username))).await?;

        match report {
            Some(content) => {
                let found = parse_report(&content);
                debug!("Sherlock found {} account(s) for {}", found.len(), username);
                let mut result = ScanData::new();
                result.insert("sherlock_data".to_string(), Value::Object(found));
                Ok(result)
            }
            None if !output.success() => Err(ScanFailure::tool_failed(TOOL, output.stderr)),
            None => {
                let mut result = ScanData::new();
                result.insert("sherlock_data".to_string(), Value::Object(ScanData::new()));
                result.insert(
                    "message".to_string(),
                    Value::String(NO_ACCOUNTS_MESSAGE.to_string()),
                );
                Ok(result)
            }
        }
    }
}
