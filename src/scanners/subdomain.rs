// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::process::{check_target_arg, resolve_binary, run_tool, ScratchSpace};
use super::Scanner;
use crate::errors::ScanFailure;
use crate::types::{ScanData, ScanOutcome, ScanType};

const TOOL: &str = "subfinder";

/// Passive subdomain enumeration through subfinder
pub struct SubdomainScanner {
    binary: String,
    scratch_root: PathBuf,
    timeout: Duration,
}

impl SubdomainScanner {
    pub fn new(binary: impl Into<String>, scratch_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            scratch_root: scratch_root.into(),
            timeout,
        }
    }
}

/// One subdomain per non-blank line
pub fn parse_subdomains(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

async fn read_results(path: &Path) -> Result<Vec<String>, ScanFailure> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(parse_subdomains(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Scanner for SubdomainScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::Subdomain
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let target = target.trim();
        let binary = resolve_binary(TOOL, &self.binary)?;
        check_target_arg(TOOL, target)?;

        let scratch = ScratchSpace::create(&self.scratch_root, "subfinder_")?;
        let output_file = scratch.file("subdomains.txt");

        info!("Enumerating subdomains of {}", target);
        let args = [
            OsStr::new("-d"),
            OsStr::new(target),
            OsStr::new("-silent"),
            OsStr::new("-o"),
            output_file.as_os_str(),
        ];
        let output = run_tool(TOOL, &binary, args, self.timeout).await?;

        if !output.success() {
            return Err(ScanFailure::tool_failed(TOOL, output.stderr));
        }

        let subdomains = read_results(&output_file).await?;
        debug!("subfinder found {} subdomain(s) for {}", subdomains.len(), target);

        let mut result = ScanData::new();
        result.insert(
            "subdomains".to_string(),
            Value::Array(subdomains.into_iter().map(Value::String).collect()),
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subdomains() {
        let parsed = parse_subdomains("www.example.com\n\n  api.example.com  \n");
        assert_eq!(parsed, vec!["www.example.com", "api.example.com"]);
    }

    #[tokio::test]
    async fn test_missing_result_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = read_results(&dir.path().join("absent.txt")).await.unwrap();
        assert!(found.is_empty());
    }
}
