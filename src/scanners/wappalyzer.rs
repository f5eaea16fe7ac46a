// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use std::time::Duration;

use super::Scanner;
use crate::errors::ScanFailure;
use crate::http_client::HttpClient;
use crate::types::{ScanOutcome, ScanType};

/// Web technology fingerprinting of a fetched page
pub struct WappalyzerScanner {
    #[cfg_attr(not(feature = "fingerprinting"), allow(dead_code))]
    http: HttpClient,
    timeout: Duration,
}

impl WappalyzerScanner {
    pub fn new(http: HttpClient, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

/// Scheme-less targets are fetched over https
pub fn page_url(target: &str) -> String {
    let target = target.trim();
    if target.starts_with("http") {
        target.to_string()
    } else {
        format!("https://{}", target)
    }
}

#[async_trait]
impl Scanner for WappalyzerScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::Wappalyzer
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    #[cfg(feature = "fingerprinting")]
    async fn execute(&self, target: &str) -> ScanOutcome {
        use super::fingerprints::{FingerprintSet, PageEvidence};
        use crate::types::ScanData;
        use tracing::{debug, info};

        let url = page_url(target);
        info!("Fingerprinting {}", url);

        let response = self
            .http
            .get(&url, self.timeout)
            .await
            .map_err(|e| {
                ScanFailure::ExternalService(format!(
                    "Wappalyzer failed: {}",
                    ScanFailure::from_http(&e)
                ))
            })?;

        let cookies = response.cookie_names();
        let page = PageEvidence::new(response.final_url, response.headers, cookies, response.body);
        let found = FingerprintSet::builtin().detect(&page);
        debug!("Detected {} technologies on {}", found.len(), url);

        let technologies = serde_json::to_value(&found)
            .map_err(|e| ScanFailure::parse("technology report", e))?;

        let mut result = ScanData::new();
        result.insert("technologies".to_string(), technologies);
        Ok(result)
    }

    #[cfg(not(feature = "fingerprinting"))]
    async fn execute(&self, _target: &str) -> ScanOutcome {
        Err(ScanFailure::NotInstalled(
            "Wappalyzer library not installed".to_string(),
        ))
    }
}
