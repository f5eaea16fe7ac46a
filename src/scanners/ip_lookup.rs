// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{resolve_host_ip, Scanner};
use crate::errors::ScanFailure;
use crate::http_client::HttpClient;
use crate::types::{ScanData, ScanOutcome, ScanType};

/// Resolves the target and enriches it with ip-api geolocation data
pub struct IpLookupScanner {
    http: HttpClient,
    api_base: String,
    timeout: Duration,
}

impl IpLookupScanner {
    pub fn new(http: HttpClient, api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn fetch_details(&self, ip: &str) -> Option<ScanData> {
        let url = format!("{}/json/{}", self.api_base, ip);

        let response = match self.http.get(&url, self.timeout).await {
            Ok(response) => response,
            Err(e) => {
                warn!("ip-api lookup for {} failed: {:#}", ip, e);
                return None;
            }
        };

        match response.json() {
            Ok(Value::Object(map)) => Some(map),
            Ok(other) => {
                debug!("ip-api returned a non-object body: {}", other);
                None
            }
            Err(e) => {
                warn!("ip-api lookup for {} returned unparseable data: {:#}", ip, e);
                None
            }
        }
    }
}

#[async_trait]
impl Scanner for IpLookupScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::IpLookup
    }

    /// One resolve plus one lookup, each bounded by `timeout`
    fn budget(&self) -> Option<Duration> {
        Some(self.timeout * 2)
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let target = target.trim();
        if target.is_empty() {
            return Err(ScanFailure::InvalidTarget("Target required".to_string()));
        }

        let ip = resolve_host_ip(target, self.timeout)
            .await
            .unwrap_or_else(|| target.to_string());

        let mut result = ScanData::new();
        result.insert("ip".to_string(), Value::String(ip.clone()));

        if let Some(details) = self.fetch_details(&ip).await {
            result.extend(details);
        }

        Ok(result)
    }
}
