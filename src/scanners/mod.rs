// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Recon Scanner Backends
 * One implementation per scan type behind a common async trait
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

use crate::types::{ScanOutcome, ScanType};

pub mod asn_lookup;
pub mod checkphish;
pub mod dns_lookup;
#[cfg(feature = "fingerprinting")]
pub mod fingerprints;
pub mod ip_lookup;
pub mod nmap;
pub mod process;
pub mod sherlock;
pub mod subdomain;
pub mod wappalyzer;
pub mod whois;

pub use asn_lookup::AsnLookupScanner;
pub use checkphish::{CheckPhishScanner, PollClock, PollState, TokioClock};
pub use dns_lookup::{DnsBackend, DnsLookupScanner, DnsQueryError, HickoryBackend};
pub use ip_lookup::IpLookupScanner;
pub use nmap::NmapScanner;
pub use sherlock::SherlockScanner;
pub use subdomain::SubdomainScanner;
pub use wappalyzer::WappalyzerScanner;
pub use whois::WhoisScanner;

/// A scan backend: takes a target, returns success data or a failure.
///
/// Implementations must stay within their budget and release every temp
/// file, child process and connection on all exit paths.
#[async_trait]
pub trait Scanner: Send + Sync {
    fn scan_type(&self) -> ScanType;

    /// Wall-clock bound advertised through the registry
    fn budget(&self) -> Option<Duration> {
        None
    }

    async fn execute(&self, target: &str) -> ScanOutcome;
}

/// Best-effort resolution of a host name to an address, IPv4 preferred.
///
/// Returns `None` when the name does not resolve within `timeout`; callers
/// fall back to the raw target.
pub async fn resolve_host_ip(target: &str, timeout: Duration) -> Option<String> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Some(ip.to_string());
    }

    pick_address(target, tokio::net::lookup_host((target, 0)), timeout).await
}

async fn pick_address<F, I>(target: &str, lookup: F, timeout: Duration) -> Option<String>
where
    F: Future<Output = std::io::Result<I>>,
    I: Iterator<Item = SocketAddr>,
{
    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(addrs)) => {
            let addrs: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
            addrs
                .iter()
                .find(|ip| ip.is_ipv4())
                .or_else(|| addrs.first())
                .map(|ip| ip.to_string())
        }
        Ok(Err(e)) => {
            debug!("Could not resolve {}: {}", target, e);
            None
        }
        Err(_) => {
            debug!("Resolving {} timed out after {:?}", target, timeout);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_resolve_literal_ip() {
        assert_eq!(
            resolve_host_ip("8.8.8.8", LOOKUP_TIMEOUT).await.as_deref(),
            Some("8.8.8.8")
        );
        assert_eq!(resolve_host_ip("::1", LOOKUP_TIMEOUT).await.as_deref(), Some("::1"));
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let ip = resolve_host_ip("localhost", LOOKUP_TIMEOUT).await;
        assert!(ip.is_some());
    }

    #[tokio::test]
    async fn test_unresolvable_name() {
        assert_eq!(resolve_host_ip("no-such-host.invalid", LOOKUP_TIMEOUT).await, None);
    }

    #[tokio::test]
    async fn test_prefers_ipv4_answer() {
        let answers: Vec<SocketAddr> = vec![
            "[2001:db8::1]:0".parse().unwrap(),
            "192.0.2.7:0".parse().unwrap(),
        ];
        let lookup = async move { Ok::<_, std::io::Error>(answers.into_iter()) };

        let ip = pick_address("dual.example", lookup, LOOKUP_TIMEOUT).await;
        assert_eq!(ip.as_deref(), Some("192.0.2.7"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_resolver_gives_up_at_timeout() {
        let lookup = std::future::pending::<std::io::Result<std::vec::IntoIter<SocketAddr>>>();

        let started = tokio::time::Instant::now();
        let ip = pick_address("slow.example", lookup, Duration::from_secs(3)).await;

        assert_eq!(ip, None);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
