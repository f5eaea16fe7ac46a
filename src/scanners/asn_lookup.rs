// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

// ASN Lookup
// Two-step HackerTarget query: address -> ASN, then ASN -> org and prefixes
// © 2026 Bountyy Oy

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{resolve_host_ip, Scanner};
use crate::errors::ScanFailure;
use crate::http_client::HttpClient;
use crate::types::{ScanData, ScanOutcome, ScanType};

static ASN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^AS\d+$").expect("valid ASN pattern"));

/// ASN and organization taken from an address lookup line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnHit {
    pub asn: String,
    pub org: String,
}

/// Organization and announced prefixes for an ASN
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsnPrefixes {
    pub org: Option<String>,
    pub prefixes: Vec<String>,
}

/// Split a line of quoted, comma-separated fields on the `","` separator
fn quoted_fields(line: &str) -> Vec<String> {
    line.trim()
        .split("\",\"")
        .map(|field| field.replace('"', ""))
        .collect()
}

/// True when the target is an AS number such as `AS15169`
pub fn is_asn(target: &str) -> bool {
    ASN_PATTERN.is_match(target.trim())
}

/// Parse `"IP","ASN","CIDR","Name"`. Lines with fewer than four fields yield
/// nothing.
pub fn parse_address_line(body: &str) -> Option<AsnHit> {
    let line = body.trim().lines().next()?;
    let fields = quoted_fields(line);
    if fields.len() < 4 {
        debug!("Short ASN lookup line skipped: {:?}", line);
        return None;
    }

    let number = fields[1].trim();
    if number.is_empty() {
        return None;
    }

    Some(AsnHit {
        asn: format!("AS{}", number),
        org: fields[3].clone(),
    })
}

/// Parse the ASN lookup reply: a `"ASN","Name"` header followed by one
/// prefix per line. A malformed header leaves `org` unset.
pub fn parse_prefix_listing(body: &str) -> AsnPrefixes {
    let mut lines = body.trim().lines();

    let org = lines.next().and_then(|header| {
        let fields = quoted_fields(header);
        if fields.len() >= 2 {
            Some(fields[1].clone())
        } else {
            debug!("Malformed ASN header skipped: {:?}", header);
            None
        }
    });

    let prefixes = lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    AsnPrefixes { org, prefixes }
}

pub struct AsnLookupScanner {
    http: HttpClient,
    api_base: String,
    timeout: Duration,
}

impl AsnLookupScanner {
    pub fn new(http: HttpClient, api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn query_url(&self, query: &str) -> String {
        format!("{}/aslookup/?q={}", self.api_base, query)
    }

    async fn asn_for_address(&self, ip: &str) -> Result<Option<AsnHit>, ScanFailure> {
        let response = self
            .http
            .get(&self.query_url(ip), self.timeout)
            .await
            .map_err(|e| ScanFailure::from_http(&e))?;

        if response.status_code != 200 {
            warn!("ASN lookup for {} returned HTTP {}", ip, response.status_code);
            return Ok(None);
        }

        Ok(parse_address_line(&response.body))
    }

    async fn prefixes_for_asn(&self, asn: &str) -> Result<AsnPrefixes, ScanFailure> {
        let response = self
            .http
            .get(&self.query_url(asn), self.timeout)
            .await
            .map_err(|e| ScanFailure::from_http(&e))?;

        if response.status_code != 200 {
            warn!("Prefix lookup for {} returned HTTP {}", asn, response.status_code);
            return Ok(AsnPrefixes::default());
        }

        Ok(parse_prefix_listing(&response.body))
    }
}

#[async_trait]
impl Scanner for AsnLookupScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::AsnLookup
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.timeout * 3)
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let target = target.trim();

        let (ip, asn, mut org) = if is_asn(target) {
            (target.to_string(), target.to_uppercase(), String::new())
        } else {
            let ip = resolve_host_ip(target, self.timeout)
                .await
                .unwrap_or_else(|| target.to_string());

            match self.asn_for_address(&ip).await? {
                Some(hit) => (ip, hit.asn, hit.org),
                None => {
                    return Err(ScanFailure::ExternalService(
                        "Could not determine ASN for target".to_string(),
                    ))
                }
            }
        };

        info!("Resolved {} to {}", target, asn);

        let listing = self.prefixes_for_asn(&asn).await?;
        if let Some(listed_org) = listing.org {
            org = listed_org;
        }

        let mut result = ScanData::new();
        result.insert(
            "asn_data".to_string(),
            json!([{
                "ip": ip,
                "asn": asn,
                "org": org,
                "prefixes": listing.prefixes,
            }]),
        );
        Ok(result)
    }
}
