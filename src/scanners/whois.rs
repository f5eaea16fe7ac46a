// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * WHOIS Scanner
 * RFC 3912 client with registry referral following
 * © 2026 Bountyy Oy
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::Scanner;
use crate::errors::ScanFailure;
use crate::types::{ScanData, ScanOutcome, ScanType};

const WHOIS_PORT: u16 = 43;
const MAX_RESPONSE_BYTES: u64 = 512 * 1024;
const MAX_REFERRALS: usize = 2;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("valid email pattern")
});

const NOT_FOUND_MARKERS: &[&str] = &[
    "no match for",
    "not found",
    "no data found",
    "no entries found",
    "status: free",
    "domain not found",
];

/// Raw key (lowercased) to normalized field name
fn normalized_key(raw: &str) -> Option<&'static str> {
    let key = match raw {
        "domain name" | "domain" => "domain_name",
        "registrar" | "sponsoring registrar" => "registrar",
        "registrar whois server" | "whois server" | "whois" => "whois_server",
        "registrar url" | "referral url" => "referral_url",
        "updated date" | "last-modified" | "last updated" | "changed" => "updated_date",
        "creation date" | "created" | "registered" | "regdate" => "creation_date",
        "registry expiry date"
        | "registrar registration expiration date"
        | "expiration date"
        | "expiry date"
        | "expires"
        | "paid-till" => "expiration_date",
        "name server" | "nserver" | "nameserver" => "name_servers",
        "domain status" | "status" => "status",
        "dnssec" => "dnssec",
        "registrant name" => "name",
        "registrant organization" | "organization" | "organisation" | "org" | "orgname" => "org",
        "registrant street" | "address" => "address",
        "registrant city" | "city" => "city",
        "registrant state/province" | "stateprov" => "state",
        "registrant postal code" | "postalcode" => "registrant_postal_code",
        "registrant country" | "country" => "country",
        "netrange" | "inetnum" | "inet6num" => "net_range",
        "cidr" => "cidr",
        "netname" => "net_name",
        _ => return None,
    };
    Some(key)
}

/// Reduce a URL or host/path to the bare name to query
pub fn query_name(target: &str) -> String {
    let target = target.trim();
    let host = if target.contains("://") {
        url::Url::parse(target)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| target.to_string())
    } else {
        target.split('/').next().unwrap_or(target).to_string()
    };
    host.trim_end_matches('.').to_lowercase()
}

/// Next server named by a response, as `host:port`
pub fn find_referral(response: &str) -> Option<String> {
    for line in response.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        if !matches!(key.as_str(), "refer" | "whois" | "registrar whois server") {
            continue;
        }

        let value = value.trim();
        let value = value
            .strip_prefix("whois://")
            .or_else(|| value.strip_prefix("rwhois://"))
            .unwrap_or(value)
            .trim_end_matches('/');
        if value.is_empty() {
            continue;
        }

        if value.parse::<SocketAddr>().is_ok() {
            return Some(value.to_string());
        }
        return Some(format!("{}:{}", value, WHOIS_PORT));
    }
    None
}

fn is_not_found(response: &str) -> bool {
    let lowered = response.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Parse `Key: Value` lines into normalized fields. Repeated fields become
/// lists; emails are collected from every value.
pub fn parse_whois(response: &str) -> ScanData {
    let mut fields: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    let mut emails: Vec<String> = Vec::new();

    for line in response.lines() {
        let line = line.trim();
        if line.starts_with(">>>") {
            break;
        }
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }

        for email in EMAIL_PATTERN.find_iter(line) {
            let email = email.as_str().to_lowercase();
            if !emails.contains(&email) {
                emails.push(email);
            }
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if let Some(field) = normalized_key(&key.trim().to_lowercase()) {
            let values = fields.entry(field).or_default();
            if !values.iter().any(|v| v.eq_ignore_ascii_case(value)) {
                values.push(value.to_string());
            }
        }
    }

    let mut data = ScanData::new();
    for (field, mut values) in fields {
        let value = if values.len() == 1 && field != "name_servers" {
            Value::String(values.remove(0))
        } else {
            Value::Array(values.into_iter().map(Value::String).collect())
        };
        data.insert(field.to_string(), value);
    }

    if !emails.is_empty() {
        data.insert(
            "emails".to_string(),
            Value::Array(emails.into_iter().map(Value::String).collect()),
        );
    }

    data
}

pub struct WhoisScanner {
    root_server: String,
    timeout: Duration,
}

impl WhoisScanner {
    pub fn new(root_server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            root_server: root_server.into(),
            timeout,
        }
    }

    async fn query(&self, server: &str, name: &str) -> Result<String, ScanFailure> {
        let exchange = async {
            let mut stream = TcpStream::connect(server).await?;
            stream.write_all(format!("{}\r\n", name).as_bytes()).await?;

            let mut raw = Vec::new();
            (&mut stream)
                .take(MAX_RESPONSE_BYTES)
                .read_to_end(&mut raw)
                .await?;
            Ok::<_, std::io::Error>(String::from_utf8_lossy(&raw).into_owned())
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ScanFailure::ExternalService(format!(
                "whois query to {} failed: {}",
                server, e
            ))),
            Err(_) => Err(ScanFailure::TimedOut {
                tool: "whois".to_string(),
                duration: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl Scanner for WhoisScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::Whois
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.timeout * (MAX_REFERRALS as u32 + 1))
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let name = query_name(target);
        if name.is_empty() || name.starts_with('-') {
            return Err(ScanFailure::InvalidTarget(format!("Invalid whois target: {:?}", target)));
        }

        let mut server = self.root_server.clone();
        let mut response = self.query(&server, &name).await?;
        let mut visited = HashSet::from([server.to_lowercase()]);

        for _ in 0..MAX_REFERRALS {
            let Some(next) = find_referral(&response) else {
                break;
            };
            // stop at any server already asked, the root included
            if !visited.insert(next.to_lowercase()) {
                debug!("whois referral for {} loops back to {}", name, next);
                break;
            }

            debug!("whois referral for {}: {} -> {}", name, server, next);
            match self.query(&next, &name).await {
                Ok(referred) if !referred.trim().is_empty() => {
                    server = next;
                    response = referred;
                }
                Ok(_) => break,
                // keep the last good answer when a registrar server misbehaves
                Err(e) => {
                    debug!("Referral to {} failed: {}", next, e);
                    break;
                }
            }
        }

        let data = parse_whois(&response);
        if !data.contains_key("domain_name") && !data.contains_key("net_range") && is_not_found(&response) {
            return Err(ScanFailure::ExternalService(format!(
                "No whois record found for {}",
                name
            )));
        }
        if data.is_empty() {
            return Err(ScanFailure::parse("whois response", "no recognizable fields"));
        }

        info!("whois for {} answered by {}", name, server);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const VERISIGN: &str = "   Domain Name: EXAMPLE.COM\r
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN\r
   Registrar WHOIS Server: whois.iana.org\r
   Registrar URL: http://res-dom.iana.org\r
   Updated Date: 2024-08-14T07:01:34Z\r
   Creation Date: 1995-08-14T04:00:00Z\r
   Registry Expiry Date: 2025-08-13T04:00:00Z\r
   Registrar: RESERVED-Internet Assigned Numbers Authority\r
   Registrar Abuse Contact Email: abuse@iana.org\r
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited\r
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited\r
   Name Server: A.IANA-SERVERS.NET\r
   Name Server: B.IANA-SERVERS.NET\r
   DNSSEC: signedDelegation\r
>>> Last update of whois database: 2024-09-01T00:00:00Z <<<\r
\r
NOTICE: The expiration date displayed in this record is the date the\r
";

    #[test]
    fn test_parse_registry_response() {
        let data = parse_whois(VERISIGN);
        assert_eq!(data["domain_name"], "EXAMPLE.COM");
        assert_eq!(data["registrar"], "RESERVED-Internet Assigned Numbers Authority");
        assert_eq!(data["creation_date"], "1995-08-14T04:00:00Z");
        assert_eq!(data["expiration_date"], "2025-08-13T04:00:00Z");
        assert_eq!(data["name_servers"].as_array().unwrap().len(), 2);
        assert_eq!(data["status"].as_array().unwrap().len(), 2);
        assert_eq!(data["emails"][0], "abuse@iana.org");
        assert_eq!(data["dnssec"], "signedDelegation");
        assert!(!data.contains_key("notice"));
    }

    #[test]
    fn test_find_referral() {
        let iana = "% IANA WHOIS server\n\nrefer:        whois.verisign-grs.com\n\ndomain:       COM\n";
        assert_eq!(
            find_referral(iana).as_deref(),
            Some("whois.verisign-grs.com:43")
        );
        assert_eq!(
            find_referral("refer: 127.0.0.1:4343").as_deref(),
            Some("127.0.0.1:4343")
        );
        assert_eq!(find_referral("Domain Name: EXAMPLE.COM"), None);
    }

    #[test]
    fn test_query_name() {
        assert_eq!(query_name("https://Example.com/path?q=1"), "example.com");
        assert_eq!(query_name("example.com/login"), "example.com");
        assert_eq!(query_name(" example.com. "), "example.com");
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found("No match for \"NOPE-4711.COM\"."));
        assert!(!is_not_found(VERISIGN));
    }

    /// Answers every connection with `reply` and records the query line
    async fn fake_server(reply: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_follows_referral() {
        let registry = "Domain Name: EXAMPLE.ORG\r\nRegistrar: Example Registrar\r\n".to_string();
        let (registry_addr, registry_handle) = fake_server(registry).await;
        let (root_addr, root_handle) =
            fake_server(format!("% root\nrefer: {}\n", registry_addr)).await;

        let scanner = WhoisScanner::new(root_addr, Duration::from_secs(2));
        let data = scanner.execute("https://example.org/about").await.unwrap();

        assert_eq!(data["domain_name"], "EXAMPLE.ORG");
        assert_eq!(data["registrar"], "Example Registrar");
        assert_eq!(root_handle.await.unwrap(), "example.org\r\n");
        assert_eq!(registry_handle.await.unwrap(), "example.org\r\n");
    }

    #[tokio::test]
    async fn test_referral_back_to_root_keeps_registry_record() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let root_addr = listener.local_addr().unwrap().to_string();
        let registry = format!(
            "Domain Name: EXAMPLE.COM\r\nRegistrar WHOIS Server: {}\r\nRegistrar: RESERVED-Internet Assigned Numbers Authority\r\n",
            root_addr
        );
        let (registry_addr, _registry_handle) = fake_server(registry).await;

        let root_reply = format!(
            "% IANA WHOIS server\nrefer: {}\n\ndomain: COM\norganisation: VeriSign Global Registry Services\n",
            registry_addr
        );
        let root_queries = Arc::new(AtomicUsize::new(0));
        let counter = root_queries.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 256];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(root_reply.as_bytes()).await;
            }
        });

        let scanner = WhoisScanner::new(root_addr, Duration::from_secs(2));
        let data = scanner.execute("example.com").await.unwrap();

        assert_eq!(data["domain_name"], "EXAMPLE.COM");
        assert_eq!(data["registrar"], "RESERVED-Internet Assigned Numbers Authority");
        assert!(!data.contains_key("org"));

        assert_eq!(root_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_follows_registry_to_registrar() {
        let registrar = "Domain Name: EXAMPLE.NET\r\nRegistrant Organization: Example Org\r\n".to_string();
        let (registrar_addr, registrar_handle) = fake_server(registrar).await;
        let (registry_addr, _registry_handle) = fake_server(format!(
            "Domain Name: EXAMPLE.NET\r\nRegistrar WHOIS Server: {}\r\n",
            registrar_addr
        ))
        .await;
        let (root_addr, _root_handle) =
            fake_server(format!("refer: {}\n\ndomain: NET\n", registry_addr)).await;

        let scanner = WhoisScanner::new(root_addr, Duration::from_secs(2));
        let data = scanner.execute("example.net").await.unwrap();

        assert_eq!(data["domain_name"], "EXAMPLE.NET");
        assert_eq!(data["org"], "Example Org");
        assert_eq!(registrar_handle.await.unwrap(), "example.net\r\n");
    }

    #[tokio::test]
    async fn test_no_match_is_error() {
        let (addr, _handle) = fake_server("No match for \"NOPE-4711.COM\".\r\n".to_string()).await;
        let scanner = WhoisScanner::new(addr, Duration::from_secs(2));
        let err = scanner.execute("nope-4711.com").await.unwrap_err();
        assert_eq!(err.to_string(), "No whois record found for nope-4711.com");
    }
}
