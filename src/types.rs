// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::errors::ScanFailure;

/// Scan type identifiers accepted by the dispatcher
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    IpLookup,
    Nmap,
    Whois,
    Subdomain,
    DnsLookup,
    Checkphish,
    AsnLookup,
    Wappalyzer,
    Sherlock,
}

impl ScanType {
    pub const ALL: [ScanType; 9] = [
        ScanType::IpLookup,
        ScanType::Nmap,
        ScanType::Whois,
        ScanType::Subdomain,
        ScanType::DnsLookup,
        ScanType::Checkphish,
        ScanType::AsnLookup,
        ScanType::Wappalyzer,
        ScanType::Sherlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::IpLookup => "ip_lookup",
            ScanType::Nmap => "nmap",
            ScanType::Whois => "whois",
            ScanType::Subdomain => "subdomain",
            ScanType::DnsLookup => "dns_lookup",
            ScanType::Checkphish => "checkphish",
            ScanType::AsnLookup => "asn_lookup",
            ScanType::Wappalyzer => "wappalyzer",
            ScanType::Sherlock => "sherlock",
        }
    }

    /// Key of this scan type's toggle in the config store
    pub fn config_key(&self) -> String {
        format!("scan_{}", self.as_str())
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown scan type: {}", s))
    }
}

/// One scan request as received from an API or CLI caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub scan_type: String,
    pub target: String,
    /// Opaque identity used by the caller for persistence and audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
}

impl ScanRequest {
    pub fn new(scan_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            scan_type: scan_type.into(),
            target: target.into(),
            requester: None,
        }
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }
}

/// Scanner-specific success payload
pub type ScanData = Map<String, Value>;

/// Typed outcome at the scanner boundary
pub type ScanOutcome = Result<ScanData, ScanFailure>;

/// Uniform result envelope.
///
/// Either a success map without an `error` key, or exactly `{"error": msg}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanResult(Map<String, Value>);

impl ScanResult {
    const ERROR_KEY: &'static str = "error";
    const UPSTREAM_ERROR_KEY: &'static str = "upstream_error";

    /// Wrap success data. An `error` key reported by an upstream service is
    /// moved to `upstream_error` so the envelope stays unambiguous.
    pub fn success(mut data: ScanData) -> Self {
        if let Some(upstream) = data.remove(Self::ERROR_KEY) {
            data.insert(Self::UPSTREAM_ERROR_KEY.to_string(), upstream);
        }
        Self(data)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(Self::ERROR_KEY.to_string(), Value::String(message.into()));
        Self(map)
    }

    pub fn is_error(&self) -> bool {
        self.0.contains_key(Self::ERROR_KEY)
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get(Self::ERROR_KEY).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<ScanOutcome> for ScanResult {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            Ok(data) => ScanResult::success(data),
            Err(failure) => ScanResult::failure(failure.to_string()),
        }
    }
}
