// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub scanners: ScannerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Endpoints, tool locations and budgets used by the scanner backends
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScannerSettings {
    #[validate(url)]
    #[serde(default = "default_ip_api_base")]
    pub ip_api_base: String,

    #[validate(url)]
    #[serde(default = "default_hackertarget_base")]
    pub hackertarget_base: String,

    #[validate(url)]
    #[serde(default = "default_checkphish_base")]
    pub checkphish_base: String,

    #[serde(default, skip_serializing)]
    pub checkphish_api_key: Option<String>,

    /// host:port of the root whois server
    #[validate(length(min = 1))]
    #[serde(default = "default_whois_server")]
    pub whois_server: String,

    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    #[serde(default = "default_subfinder_path")]
    pub subfinder_path: String,

    #[serde(default = "default_sherlock_path")]
    pub sherlock_path: String,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_ip_lookup_timeout")]
    pub ip_lookup_timeout_secs: u64,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_asn_timeout")]
    pub asn_timeout_secs: u64,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_checkphish_submit_timeout")]
    pub checkphish_submit_timeout_secs: u64,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_checkphish_poll_timeout")]
    pub checkphish_poll_timeout_secs: u64,

    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_checkphish_poll_attempts")]
    pub checkphish_poll_attempts: u32,

    #[serde(default = "default_checkphish_poll_interval")]
    pub checkphish_poll_interval_secs: u64,

    #[serde(default = "default_nmap_timeout")]
    pub nmap_timeout_secs: u64,

    #[serde(default = "default_subfinder_timeout")]
    pub subfinder_timeout_secs: u64,

    #[serde(default = "default_sherlock_timeout")]
    pub sherlock_timeout_secs: u64,

    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_secs: u64,

    #[validate(range(min = 1, max = 120))]
    #[serde(default = "default_whois_timeout")]
    pub whois_timeout_secs: u64,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_wappalyzer_timeout")]
    pub wappalyzer_timeout_secs: u64,

    /// Root under which per-invocation scratch directories are created
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    #[validate(length(min = 1))]
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ScannerSettings {
    pub fn ip_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.ip_lookup_timeout_secs)
    }

    pub fn asn_timeout(&self) -> Duration {
        Duration::from_secs(self.asn_timeout_secs)
    }

    pub fn checkphish_submit_timeout(&self) -> Duration {
        Duration::from_secs(self.checkphish_submit_timeout_secs)
    }

    pub fn checkphish_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.checkphish_poll_timeout_secs)
    }

    pub fn checkphish_poll_interval(&self) -> Duration {
        Duration::from_secs(self.checkphish_poll_interval_secs)
    }

    pub fn nmap_timeout(&self) -> Duration {
        Duration::from_secs(self.nmap_timeout_secs)
    }

    pub fn subfinder_timeout(&self) -> Duration {
        Duration::from_secs(self.subfinder_timeout_secs)
    }

    pub fn sherlock_timeout(&self) -> Duration {
        Duration::from_secs(self.sherlock_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn whois_timeout(&self) -> Duration {
        Duration::from_secs(self.whois_timeout_secs)
    }

    pub fn wappalyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.wappalyzer_timeout_secs)
    }
}

/// Local files used by the CLI for the gate store and scan records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_config_store_path")]
    pub config_store_path: PathBuf,

    #[serde(default = "default_scan_log_path")]
    pub scan_log_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_false")]
    pub log_target: bool,
}

impl AppConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(key) = std::env::var("CHECKPHISH_API_KEY") {
            if !key.trim().is_empty() {
                self.scanners.checkphish_api_key = Some(key.trim().to_string());
            }
        }

        if let Ok(dir) = std::env::var("RECONHUB_SCRATCH_DIR") {
            self.scanners.scratch_dir = PathBuf::from(dir);
        }

        if let Ok(path) = std::env::var("RECONHUB_NMAP_PATH") {
            self.scanners.nmap_path = path;
        }

        if let Ok(path) = std::env::var("RECONHUB_SUBFINDER_PATH") {
            self.scanners.subfinder_path = path;
        }

        if let Ok(path) = std::env::var("RECONHUB_SHERLOCK_PATH") {
            self.scanners.sherlock_path = path;
        }

        if let Ok(path) = std::env::var("RECONHUB_CONFIG_STORE") {
            self.storage.config_store_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("RECONHUB_SCAN_LOG") {
            self.storage.scan_log_path = PathBuf::from(path);
        }

        if let Ok(timeout) = std::env::var("RECONHUB_NMAP_TIMEOUT") {
            self.scanners.nmap_timeout_secs = timeout
                .parse()
                .context("Invalid RECONHUB_NMAP_TIMEOUT")?;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            self.observability.log_level = log_level;
        }

        Ok(())
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            ip_api_base: default_ip_api_base(),
            hackertarget_base: default_hackertarget_base(),
            checkphish_base: default_checkphish_base(),
            checkphish_api_key: None,
            whois_server: default_whois_server(),
            nmap_path: default_nmap_path(),
            subfinder_path: default_subfinder_path(),
            sherlock_path: default_sherlock_path(),
            ip_lookup_timeout_secs: default_ip_lookup_timeout(),
            asn_timeout_secs: default_asn_timeout(),
            checkphish_submit_timeout_secs: default_checkphish_submit_timeout(),
            checkphish_poll_timeout_secs: default_checkphish_poll_timeout(),
            checkphish_poll_attempts: default_checkphish_poll_attempts(),
            checkphish_poll_interval_secs: default_checkphish_poll_interval(),
            nmap_timeout_secs: default_nmap_timeout(),
            subfinder_timeout_secs: default_subfinder_timeout(),
            sherlock_timeout_secs: default_sherlock_timeout(),
            dns_timeout_secs: default_dns_timeout(),
            whois_timeout_secs: default_whois_timeout(),
            wappalyzer_timeout_secs: default_wappalyzer_timeout(),
            scratch_dir: default_scratch_dir(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            config_store_path: default_config_store_path(),
            scan_log_path: default_scan_log_path(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_target: false,
        }
    }
}

fn default_ip_api_base() -> String {
    "http://ip-api.com".to_string()
}

fn default_hackertarget_base() -> String {
    "https://api.hackertarget.com".to_string()
}

fn default_checkphish_base() -> String {
    "https://developers.checkphish.ai/api/neo".to_string()
}

fn default_whois_server() -> String {
    "whois.iana.org:43".to_string()
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_subfinder_path() -> String {
    "subfinder".to_string()
}

fn default_sherlock_path() -> String {
    "sherlock".to_string()
}

fn default_ip_lookup_timeout() -> u64 {
    5
}

fn default_asn_timeout() -> u64 {
    10
}

fn default_checkphish_submit_timeout() -> u64 {
    15
}

fn default_checkphish_poll_timeout() -> u64 {
    10
}

fn default_checkphish_poll_attempts() -> u32 {
    10
}

fn default_checkphish_poll_interval() -> u64 {
    3
}

fn default_nmap_timeout() -> u64 {
    180
}

fn default_subfinder_timeout() -> u64 {
    120
}

fn default_sherlock_timeout() -> u64 {
    300
}

fn default_dns_timeout() -> u64 {
    5
}

fn default_whois_timeout() -> u64 {
    10
}

fn default_wappalyzer_timeout() -> u64 {
    15
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_user_agent() -> String {
    concat!("ReconHub/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_config_store_path() -> PathBuf {
    PathBuf::from("reconhub-config.json")
}

fn default_scan_log_path() -> PathBuf {
    PathBuf::from("reconhub-scans.jsonl")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
