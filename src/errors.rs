// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - ReconHub Error Types
 * Dispatch rejections and scanner failures with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

/// Rejections raised by the dispatcher before any scanner runs.
///
/// These are the only errors a caller ever receives as `Err`. Everything that
/// goes wrong inside a scanner is carried in the result envelope instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Missing target or scan type
    #[error("{0}")]
    InvalidRequest(String),

    /// Scan type is not registered
    #[error("Invalid scan type: {0}")]
    UnsupportedScanType(String),

    /// Scan type switched off in the config gate
    #[error("Scan type '{0}' is currently disabled by admin")]
    ScanDisabled(String),

    /// The config store could not be read; the dispatch fails closed
    #[error("Scan configuration unavailable: {0}")]
    GateUnavailable(String),
}

impl DispatchError {
    /// HTTP status an API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::InvalidRequest(_) => 400,
            DispatchError::UnsupportedScanType(_) => 400,
            DispatchError::ScanDisabled(_) => 403,
            DispatchError::GateUnavailable(_) => 503,
        }
    }
}

/// Failure reported by a scanner implementation.
///
/// The `Display` text becomes the `error` field of the envelope, so the
/// messages here are what API consumers read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanFailure {
    #[error("{tool} tool not found in system path")]
    ToolNotFound { tool: String },

    #[error("{tool} scan timed out after {}s", .duration.as_secs())]
    TimedOut { tool: String, duration: Duration },

    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    #[error("{0}")]
    ExternalService(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("Domain not found")]
    DomainNotFound,

    #[error("Host down or unreachable")]
    HostUnreachable,

    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    NotInstalled(String),

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("scanner crashed")]
    Crashed,
}

impl ScanFailure {
    pub fn tool_failed(tool: &str, stderr: impl Into<String>) -> Self {
        ScanFailure::ToolFailed {
            tool: tool.to_string(),
            stderr: stderr.into().trim().to_string(),
        }
    }

    pub fn parse(what: &str, reason: impl ToString) -> Self {
        ScanFailure::Parse {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the host environment rather than the target
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            ScanFailure::ToolNotFound { .. }
                | ScanFailure::NotConfigured(_)
                | ScanFailure::NotInstalled(_)
                | ScanFailure::Io(_)
        )
    }
}

impl From<std::io::Error> for ScanFailure {
    fn from(err: std::io::Error) -> Self {
        ScanFailure::Io(err.to_string())
    }
}

impl ScanFailure {
    /// Classify a failed HTTP call made through [`crate::http_client::HttpClient`]
    pub fn from_http(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<reqwest::Error>() {
            Some(e) => {
                let host = e
                    .url()
                    .and_then(|u| u.host_str().map(|h| h.to_string()))
                    .unwrap_or_default();

                if e.is_timeout() {
                    ScanFailure::ExternalService(format!("Request to {} timed out", host))
                } else if e.is_connect() {
                    ScanFailure::ExternalService(format!("Could not connect to {}", host))
                } else {
                    ScanFailure::ExternalService(e.to_string())
                }
            }
            None => ScanFailure::ExternalService(format!("{:#}", err)),
        }
    }
}

/// Errors raised while assembling the scanner registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Scanner already registered for scan type {0}")]
    Duplicate(String),

    #[error("Failed to build scanner {scan_type}: {reason}")]
    Construction { scan_type: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_status_codes() {
        assert_eq!(DispatchError::InvalidRequest("Target required".into()).status_code(), 400);
        assert_eq!(DispatchError::UnsupportedScanType("x".into()).status_code(), 400);
        assert_eq!(DispatchError::ScanDisabled("nmap".into()).status_code(), 403);
        assert_eq!(DispatchError::GateUnavailable("io".into()).status_code(), 503);
    }

    #[test]
    fn test_failure_messages() {
        let err = ScanFailure::ToolNotFound { tool: "subfinder".into() };
        assert_eq!(err.to_string(), "subfinder tool not found in system path");

        let err = ScanFailure::TimedOut {
            tool: "nmap".into(),
            duration: Duration::from_secs(180),
        };
        assert_eq!(err.to_string(), "nmap scan timed out after 180s");

        let err = ScanFailure::tool_failed("subfinder", "bad flag\n");
        assert_eq!(err.to_string(), "subfinder failed: bad flag");

        assert_eq!(ScanFailure::Crashed.to_string(), "scanner crashed");
        assert_eq!(ScanFailure::DomainNotFound.to_string(), "Domain not found");
    }

    #[test]
    fn test_environmental_failures() {
        assert!(ScanFailure::ToolNotFound { tool: "nmap".into() }.is_environmental());
        assert!(!ScanFailure::DomainNotFound.is_environmental());
    }
}
