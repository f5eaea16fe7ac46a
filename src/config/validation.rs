// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use validator::Validate;

use super::core::AppConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_app_config(config: &AppConfig) -> Result<()> {
        config
            .validate()
            .context("Configuration validation failed")?;

        Self::validate_endpoints(config)?;
        Self::validate_tools(config)?;

        Ok(())
    }

    fn validate_endpoints(config: &AppConfig) -> Result<()> {
        let scanners = &config.scanners;

        for (name, base) in [
            ("ip_api_base", &scanners.ip_api_base),
            ("hackertarget_base", &scanners.hackertarget_base),
            ("checkphish_base", &scanners.checkphish_base),
        ] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "{} must start with http:// or https://",
                    name
                ));
            }
        }

        if !scanners.whois_server.contains(':') {
            return Err(anyhow::anyhow!("whois_server must be given as host:port"));
        }

        Ok(())
    }

    fn validate_tools(config: &AppConfig) -> Result<()> {
        let scanners = &config.scanners;

        for (name, path) in [
            ("nmap_path", &scanners.nmap_path),
            ("subfinder_path", &scanners.subfinder_path),
            ("sherlock_path", &scanners.sherlock_path),
        ] {
            if path.trim().is_empty() {
                return Err(anyhow::anyhow!("{} cannot be empty", name));
            }
        }

        if scanners.scratch_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("scratch_dir cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigValidator::validate_app_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_http_budget() {
        let mut config = AppConfig::default();
        config.scanners.ip_lookup_timeout_secs = 0;
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }

    #[test]
    fn test_rejects_non_http_base() {
        let mut config = AppConfig::default();
        config.scanners.hackertarget_base = "ftp://api.hackertarget.com".to_string();
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_poll_attempts() {
        let mut config = AppConfig::default();
        config.scanners.checkphish_poll_attempts = 0;
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_tool_path() {
        let mut config = AppConfig::default();
        config.scanners.sherlock_path = "  ".to_string();
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }
}
