// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Scanner Registry
 * Fixed mapping from scan type to implementation and static metadata
 * © 2026 Bountyy Oy
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ScannerSettings;
use crate::errors::RegistryError;
use crate::http_client::HttpClient;
use crate::scanners::{
    AsnLookupScanner, CheckPhishScanner, DnsLookupScanner, HickoryBackend, IpLookupScanner,
    NmapScanner, Scanner, SherlockScanner, SubdomainScanner, WappalyzerScanner, WhoisScanner,
};
use crate::types::ScanType;

/// How a scanner reaches its data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    RemoteApi,
    PollingRemoteJob,
    LocalResolver,
    ExternalProcess,
    Library,
}

/// What a scanner expects as its target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Hostname,
    IpOrHostname,
    Domain,
    Url,
    Username,
    AsnOrHost,
}

/// Scanner metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerMetadata {
    pub scan_type: ScanType,
    pub display_name: String,
    pub description: String,
    pub strategy: ExecutionStrategy,
    pub target_kind: TargetKind,
    /// Advertised wall-clock bound, when the scanner has one
    pub budget_secs: Option<u64>,
    /// External binaries or credentials the scanner needs
    pub dependencies: Vec<String>,
}

impl ScannerMetadata {
    fn describe(scan_type: ScanType, scanner: &dyn Scanner) -> Self {
        let (display_name, description, strategy, target_kind, dependencies): (
            &str,
            &str,
            ExecutionStrategy,
            TargetKind,
            &[&str],
        ) = match scan_type {
            ScanType::IpLookup => (
                "IP Lookup",
                "Resolves the target and adds ip-api geolocation details",
                ExecutionStrategy::RemoteApi,
                TargetKind::IpOrHostname,
                &[],
            ),
            ScanType::Nmap => (
                "Nmap Port Scan",
                "Fast scan of the most common ports",
                ExecutionStrategy::ExternalProcess,
                TargetKind::IpOrHostname,
                &["nmap"],
            ),
            ScanType::Whois => (
                "WHOIS",
                "Domain registration record with registry referral",
                ExecutionStrategy::Library,
                TargetKind::Domain,
                &[],
            ),
            ScanType::Subdomain => (
                "Subdomain Enumeration",
                "Passive subdomain discovery",
                ExecutionStrategy::ExternalProcess,
                TargetKind::Domain,
                &["subfinder"],
            ),
            ScanType::DnsLookup => (
                "DNS Records",
                "A, AAAA, MX, NS, TXT, CNAME and SOA records",
                ExecutionStrategy::LocalResolver,
                TargetKind::Domain,
                &[],
            ),
            ScanType::Checkphish => (
                "CheckPhish",
                "Phishing verdict for a URL from a remote scan job",
                ExecutionStrategy::PollingRemoteJob,
                TargetKind::Url,
                &["CHECKPHISH_API_KEY"],
            ),
            ScanType::AsnLookup => (
                "ASN Lookup",
                "Autonomous system and announced prefixes",
                ExecutionStrategy::RemoteApi,
                TargetKind::AsnOrHost,
                &[],
            ),
            ScanType::Wappalyzer => (
                "Technology Fingerprint",
                "Web technologies detected on the landing page",
                ExecutionStrategy::Library,
                TargetKind::Url,
                &[],
            ),
            ScanType::Sherlock => (
                "Username Search",
                "Accounts registered under a username",
                ExecutionStrategy::ExternalProcess,
                TargetKind::Username,
                &["sherlock"],
            ),
        };

        Self {
            scan_type,
            display_name: display_name.to_string(),
            description: description.to_string(),
            strategy,
            target_kind,
            budget_secs: scanner.budget().map(|d| d.as_secs()),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        }
    }
}

struct Registration {
    scanner: Arc<dyn Scanner>,
    metadata: ScannerMetadata,
}

/// Scanner Registry. Immutable once built; share it behind an `Arc`.
pub struct ScannerRegistry {
    scanners: HashMap<ScanType, Registration>,
}

impl ScannerRegistry {
    /// Register the given scanners, each under the type it reports
    pub fn from_scanners<I>(scanners: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn Scanner>>,
    {
        let mut registry = Self {
            scanners: HashMap::new(),
        };

        for scanner in scanners {
            let scan_type = scanner.scan_type();
            if registry.scanners.contains_key(&scan_type) {
                return Err(RegistryError::Duplicate(scan_type.to_string()));
            }

            let metadata = ScannerMetadata::describe(scan_type, scanner.as_ref());
            debug!("Registered {} scanner", scan_type);
            registry
                .scanners
                .insert(scan_type, Registration { scanner, metadata });
        }

        Ok(registry)
    }

    /// All nine production scanners wired from settings
    pub fn with_defaults(settings: &ScannerSettings) -> Result<Self, RegistryError> {
        let http = HttpClient::new(&settings.user_agent).map_err(|e| {
            RegistryError::Construction {
                scan_type: "http".to_string(),
                reason: format!("{:#}", e),
            }
        })?;

        let checkphish = CheckPhishScanner::new(
            http.clone(),
            settings.checkphish_base.clone(),
            settings.checkphish_api_key.clone(),
        )
        .with_timeouts(
            settings.checkphish_submit_timeout(),
            settings.checkphish_poll_timeout(),
        )
        .with_polling(
            settings.checkphish_poll_attempts,
            settings.checkphish_poll_interval(),
        );

        let scanners: Vec<Arc<dyn Scanner>> = vec![
            Arc::new(IpLookupScanner::new(
                http.clone(),
                settings.ip_api_base.clone(),
                settings.ip_lookup_timeout(),
            )),
            Arc::new(NmapScanner::new(
                settings.nmap_path.clone(),
                settings.nmap_timeout(),
            )),
            Arc::new(WhoisScanner::new(
                settings.whois_server.clone(),
                settings.whois_timeout(),
            )),
            Arc::new(SubdomainScanner::new(
                settings.subfinder_path.clone(),
                settings.scratch_dir.clone(),
                settings.subfinder_timeout(),
            )),
            Arc::new(DnsLookupScanner::new(
                Arc::new(HickoryBackend::from_system()),
                settings.dns_timeout(),
            )),
            Arc::new(checkphish),
            Arc::new(AsnLookupScanner::new(
                http.clone(),
                settings.hackertarget_base.clone(),
                settings.asn_timeout(),
            )),
            Arc::new(WappalyzerScanner::new(http, settings.wappalyzer_timeout())),
            Arc::new(SherlockScanner::new(
                settings.sherlock_path.clone(),
                settings.scratch_dir.clone(),
                settings.sherlock_timeout(),
            )),
        ];

        let registry = Self::from_scanners(scanners)?;
        info!("Scanner registry ready with {} scan types", registry.count());
        Ok(registry)
    }

    /// Look up a scan type by its wire name. Unknown names and unregistered
    /// types are both a miss.
    pub fn get(&self, scan_type: &str) -> Option<(ScanType, Arc<dyn Scanner>)> {
        let scan_type: ScanType = scan_type.parse().ok()?;
        self.lookup(scan_type)
            .map(|scanner| (scan_type, scanner))
    }

    pub fn lookup(&self, scan_type: ScanType) -> Option<Arc<dyn Scanner>> {
        self.scanners
            .get(&scan_type)
            .map(|r| Arc::clone(&r.scanner))
    }

    pub fn metadata(&self, scan_type: ScanType) -> Option<&ScannerMetadata> {
        self.scanners.get(&scan_type).map(|r| &r.metadata)
    }

    /// Registered scan types in canonical order
    pub fn scan_types(&self) -> Vec<ScanType> {
        let mut types: Vec<ScanType> = self.scanners.keys().copied().collect();
        types.sort();
        types
    }

    /// Metadata of every registered scanner, canonical order
    pub fn all_metadata(&self) -> Vec<&ScannerMetadata> {
        self.scan_types()
            .into_iter()
            .filter_map(|t| self.metadata(t))
            .collect()
    }

    pub fn by_strategy(&self, strategy: ExecutionStrategy) -> Vec<ScanType> {
        self.scan_types()
            .into_iter()
            .filter(|t| {
                self.metadata(*t)
                    .map(|m| m.strategy == strategy)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn exists(&self, scan_type: &str) -> bool {
        self.get(scan_type).is_some()
    }

    pub fn count(&self) -> usize {
        self.scanners.len()
    }
}
