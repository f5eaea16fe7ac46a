// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Nmap Port Scanner
 * Fast top-port scan with XML report parsing
 * © 2026 Bountyy Oy
 */

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info};

use super::process::{check_target_arg, resolve_binary, run_tool};
use super::Scanner;
use crate::errors::ScanFailure;
use crate::types::{ScanData, ScanOutcome, ScanType};

const TOOL: &str = "nmap";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hostname {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostStatus {
    pub state: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortInfo {
    pub state: String,
    pub reason: String,
    pub name: String,
    pub product: String,
    pub version: String,
    pub extrainfo: String,
    pub conf: String,
    pub cpe: String,
}

/// One scanned host, keyed per protocol (`tcp`, `udp`) by port number
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NmapHost {
    pub hostnames: Vec<Hostname>,
    pub addresses: BTreeMap<String, String>,
    pub vendor: BTreeMap<String, String>,
    pub status: HostStatus,
    #[serde(flatten)]
    pub protocols: BTreeMap<String, BTreeMap<String, PortInfo>>,
}

impl NmapHost {
    /// Primary address, IPv4 first
    pub fn address(&self) -> Option<&str> {
        self.addresses
            .get("ipv4")
            .or_else(|| self.addresses.get("ipv6"))
            .map(String::as_str)
    }
}

fn xml_error(err: impl ToString) -> ScanFailure {
    ScanFailure::parse("nmap XML report", err)
}

fn attributes(
    element: &BytesStart,
    reader: &Reader<&[u8]>,
) -> Result<HashMap<String, String>, ScanFailure> {
    let mut out = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = reader.decoder().decode(&attr.value).map_err(xml_error)?;
        let value = quick_xml::escape::unescape(&raw).map_err(xml_error)?;
        out.insert(key, value.into_owned());
    }
    Ok(out)
}

fn take(attrs: &mut HashMap<String, String>, key: &str) -> String {
    attrs.remove(key).unwrap_or_default()
}

#[derive(Default)]
struct OpenPort {
    protocol: String,
    port: String,
    info: PortInfo,
}

/// Parse an `nmap -oX` report into its hosts, in document order
pub fn parse_nmap_xml(xml: &str) -> Result<Vec<NmapHost>, ScanFailure> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut hosts = Vec::new();
    let mut host: Option<NmapHost> = None;
    let mut port: Option<OpenPort> = None;
    let mut in_cpe = false;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                let mut attrs = attributes(e, &reader)?;

                match e.name().as_ref() {
                    b"host" => host = Some(NmapHost::default()),
                    b"status" => {
                        if let Some(h) = host.as_mut() {
                            h.status = HostStatus {
                                state: take(&mut attrs, "state"),
                                reason: take(&mut attrs, "reason"),
                            };
                        }
                    }
                    b"address" => {
                        if let Some(h) = host.as_mut() {
                            let addr = take(&mut attrs, "addr");
                            if let Some(vendor) = attrs.remove("vendor") {
                                h.vendor.insert(addr.clone(), vendor);
                            }
                            h.addresses.insert(take(&mut attrs, "addrtype"), addr);
                        }
                    }
                    b"hostname" => {
                        if let Some(h) = host.as_mut() {
                            h.hostnames.push(Hostname {
                                name: take(&mut attrs, "name"),
                                kind: take(&mut attrs, "type"),
                            });
                        }
                    }
                    b"port" if host.is_some() => {
                        let open = OpenPort {
                            protocol: take(&mut attrs, "protocol"),
                            port: take(&mut attrs, "portid"),
                            info: PortInfo::default(),
                        };
                        if empty {
                            if let Some(h) = host.as_mut() {
                                store_port(h, open);
                            }
                        } else {
                            port = Some(open);
                        }
                    }
                    b"state" => {
                        if let Some(p) = port.as_mut() {
                            p.info.state = take(&mut attrs, "state");
                            p.info.reason = take(&mut attrs, "reason");
                        }
                    }
                    b"service" => {
                        if let Some(p) = port.as_mut() {
                            p.info.name = take(&mut attrs, "name");
                            p.info.product = take(&mut attrs, "product");
                            p.info.version = take(&mut attrs, "version");
                            p.info.extrainfo = take(&mut attrs, "extrainfo");
                            p.info.conf = take(&mut attrs, "conf");
                        }
                    }
                    b"cpe" => in_cpe = port.is_some() && !empty,
                    _ => {}
                }
            }
            Event::Text(ref t) if in_cpe => {
                if let Some(p) = port.as_mut() {
                    let text = reader.decoder().decode(t.as_ref()).map_err(xml_error)?;
                    p.info.cpe = text.trim().to_string();
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"cpe" => in_cpe = false,
                b"port" => {
                    if let (Some(h), Some(open)) = (host.as_mut(), port.take()) {
                        store_port(h, open);
                    }
                }
                b"host" => {
                    if let Some(h) = host.take() {
                        hosts.push(h);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(hosts)
}

fn store_port(host: &mut NmapHost, open: OpenPort) {
    host.protocols
        .entry(open.protocol)
        .or_default()
        .insert(open.port, open.info);
}

/// Pick the host matching `target`, else the first one annotated with the
/// address it resolved to.
pub fn select_host(target: &str, hosts: Vec<NmapHost>) -> ScanOutcome {
    let matching = hosts
        .iter()
        .position(|h| h.addresses.values().any(|addr| addr == target));

    let (host, resolved) = match matching {
        Some(index) => (hosts.into_iter().nth(index), None),
        None => {
            let first = hosts.into_iter().next();
            let resolved = first.as_ref().and_then(|h| h.address().map(str::to_string));
            (first, resolved)
        }
    };

    let host = host.ok_or(ScanFailure::HostUnreachable)?;

    let mut data = match serde_json::to_value(&host).map_err(xml_error)? {
        Value::Object(map) => map,
        _ => ScanData::new(),
    };

    if let Some(ip) = resolved {
        data.insert("resolved_ip".to_string(), Value::String(ip));
    }

    Ok(data)
}

pub struct NmapScanner {
    binary: String,
    timeout: Duration,
}

impl NmapScanner {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Scanner for NmapScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::Nmap
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let target = target.trim();
        let binary = resolve_binary(TOOL, &self.binary)?;
        check_target_arg(TOOL, target)?;

        info!("Running nmap fast scan against {}", target);
        let output = run_tool(TOOL, &binary, ["-F", "-oX", "-", target], self.timeout).await?;

        if !output.success() {
            return Err(ScanFailure::tool_failed(TOOL, output.stderr));
        }

        let hosts = parse_nmap_xml(&output.stdout)?;
        debug!("nmap reported {} host(s) for {}", hosts.len(), target);

        select_host(target, hosts)
    }
}
