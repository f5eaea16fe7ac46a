// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

// DNS Record Lookup
// Common record types through the system resolver
// © 2026 Bountyy Oy

use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioResolver;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::Scanner;
use crate::errors::ScanFailure;
use crate::types::{ScanData, ScanOutcome, ScanType};

pub const NO_RECORDS_MESSAGE: &str = "No common DNS records found";

/// Record types queried, in result order
pub const RECORD_TYPES: [RecordType; 7] = [
    RecordType::A,
    RecordType::AAAA,
    RecordType::MX,
    RecordType::NS,
    RecordType::TXT,
    RecordType::CNAME,
    RecordType::SOA,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsQueryError {
    /// The name does not exist
    NxDomain,
    /// The name exists but has no records of the requested type
    NoRecords,
    Other(String),
}

/// Resolver seam; production uses hickory, tests use fakes
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// Records of `record_type` for `name` in presentation format
    async fn query(&self, name: &str, record_type: RecordType)
        -> Result<Vec<String>, DnsQueryError>;
}

pub struct HickoryBackend {
    resolver: TokioResolver,
}

impl HickoryBackend {
    /// System resolver, or public defaults when the system config is unreadable
    pub fn from_system() -> Self {
        let resolver = match TokioResolver::builder(TokioConnectionProvider::default()) {
            Ok(builder) => builder.build(),
            Err(e) => {
                warn!("System resolver configuration unavailable ({}), using defaults", e);
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        };

        Self { resolver }
    }
}

#[async_trait]
impl DnsBackend for HickoryBackend {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, DnsQueryError> {
        match self.resolver.lookup(name, record_type).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .filter(|rdata| rdata.record_type() == record_type)
                .map(|rdata| rdata.to_string())
                .collect()),
            Err(e) if e.is_nx_domain() => Err(DnsQueryError::NxDomain),
            Err(e) if e.is_no_records_found() => Err(DnsQueryError::NoRecords),
            Err(e) => Err(DnsQueryError::Other(e.to_string())),
        }
    }
}

pub struct DnsLookupScanner {
    backend: Arc<dyn DnsBackend>,
    timeout: Duration,
}

impl DnsLookupScanner {
    pub fn new(backend: Arc<dyn DnsBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }
}

#[async_trait]
impl Scanner for DnsLookupScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::DnsLookup
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.timeout * RECORD_TYPES.len() as u32)
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let domain = target.trim();
        let mut result = ScanData::new();

        for record_type in RECORD_TYPES {
            let answer = tokio::time::timeout(self.timeout, self.backend.query(domain, record_type)).await;

            match answer {
                Ok(Ok(records)) if !records.is_empty() => {
                    result.insert(
                        record_type.to_string(),
                        Value::Array(records.into_iter().map(Value::String).collect()),
                    );
                }
                Ok(Ok(_)) | Ok(Err(DnsQueryError::NoRecords)) => {}
                Ok(Err(DnsQueryError::NxDomain)) => {
                    debug!("{} does not exist", domain);
                    return Err(ScanFailure::DomainNotFound);
                }
                Ok(Err(DnsQueryError::Other(reason))) => {
                    debug!("{} lookup for {} failed: {}", record_type, domain, reason);
                }
                Err(_) => {
                    debug!("{} lookup for {} timed out", record_type, domain);
                }
            }
        }

        if result.is_empty() {
            result.insert(
                "message".to_string(),
                Value::String(NO_RECORDS_MESSAGE.to_string()),
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanResult;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeBackend {
        answers: HashMap<RecordType, Result<Vec<String>, DnsQueryError>>,
        slow: Option<RecordType>,
    }

    #[async_trait]
    impl DnsBackend for FakeBackend {
        async fn query(
            &self,
            _name: &str,
            record_type: RecordType,
        ) -> Result<Vec<String>, DnsQueryError> {
            if self.slow == Some(record_type) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.answers
                .get(&record_type)
                .cloned()
                .unwrap_or(Err(DnsQueryError::NoRecords))
        }
    }

    fn scanner(backend: FakeBackend) -> DnsLookupScanner {
        DnsLookupScanner::new(Arc::new(backend), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_only_a_records() {
        let mut backend = FakeBackend::default();
        backend
            .answers
            .insert(RecordType::A, Ok(vec!["93.184.216.34".to_string()]));

        let data = scanner(backend).execute("example.com").await.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["A"], json!(["93.184.216.34"]));
    }

    #[tokio::test]
    async fn test_nxdomain_short_circuits() {
        let mut backend = FakeBackend::default();
        backend
            .answers
            .insert(RecordType::A, Ok(vec!["10.0.0.1".to_string()]));
        backend.answers.insert(RecordType::MX, Err(DnsQueryError::NxDomain));

        let result: ScanResult = scanner(backend).execute("gone.example").await.into();
        assert_eq!(result.into_value(), json!({"error": "Domain not found"}));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let mut backend = FakeBackend::default();
        backend
            .answers
            .insert(RecordType::TXT, Err(DnsQueryError::Other("SERVFAIL".to_string())));

        let data = scanner(backend).execute("quiet.example").await.unwrap();
        assert_eq!(Value::Object(data), json!({"message": NO_RECORDS_MESSAGE}));
    }

    #[tokio::test]
    async fn test_slow_type_is_skipped() {
        let mut backend = FakeBackend::default();
        backend
            .answers
            .insert(RecordType::A, Ok(vec!["10.0.0.1".to_string()]));
        backend
            .answers
            .insert(RecordType::NS, Ok(vec!["ns1.example.".to_string()]));
        backend.slow = Some(RecordType::NS);

        let data = scanner(backend).execute("example.com").await.unwrap();
        assert!(data.contains_key("A"));
        assert!(!data.contains_key("NS"));
    }
}
