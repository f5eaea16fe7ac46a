// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! ReconHub - Parser Benchmarks
//! © 2026 Bountyy Oy
//!
//! Throughput of the tool-output parsers on realistic payloads

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reconhub::scanners::asn_lookup::{parse_address_line, parse_prefix_listing};
use reconhub::scanners::nmap::parse_nmap_xml;
use reconhub::scanners::sherlock::parse_report;
use reconhub::scanners::whois::{find_referral, parse_whois};
use std::collections::HashMap;
use std::time::Duration;

fn nmap_report(ports: usize) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\"?>\n<nmaprun scanner=\"nmap\">\n<host><status state=\"up\" reason=\"syn-ack\"/>\n\
         <address addr=\"192.0.2.10\" addrtype=\"ipv4\"/>\n<hostnames><hostname name=\"bench.example\" type=\"user\"/></hostnames>\n<ports>\n",
    );
    for port in 0..ports {
        xml.push_str(&format!(
            "<port protocol=\"tcp\" portid=\"{}\"><state state=\"open\" reason=\"syn-ack\"/>\
             <service name=\"svc{}\" product=\"Product\" version=\"1.{}\"><cpe>cpe:/a:vendor:product</cpe></service></port>\n",
            1000 + port,
            port,
            port
        ));
    }
    xml.push_str("</ports>\n</host>\n</nmaprun>");
    xml
}

fn benchmark_nmap_xml(c: &mut Criterion) {
    let mut group = c.benchmark_group("nmap_xml");
    for ports in [10, 100] {
        let report = nmap_report(ports);
        group.bench_with_input(BenchmarkId::from_parameter(ports), &report, |b, xml| {
            b.iter(|| parse_nmap_xml(black_box(xml)))
        });
    }
    group.finish();
}

fn benchmark_asn(c: &mut Criterion) {
    let address = "\"8.8.8.8\",\"15169\",\"8.8.8.0/24\",\"GOOGLE, US\"\n";
    let mut listing = String::from("\"AS15169\",\"GOOGLE, US\"\n");
    for i in 0..500 {
        listing.push_str(&format!("10.{}.{}.0/24\n", i / 256, i % 256));
    }

    c.bench_function("asn_address_line", |b| {
        b.iter(|| parse_address_line(black_box(address)))
    });
    c.bench_function("asn_prefix_listing", |b| {
        b.iter(|| parse_prefix_listing(black_box(&listing)))
    });
}

fn benchmark_sherlock_csv(c: &mut Criterion) {
    let mut csv = String::from("username,name,url_main,url_user,exists,http_status,response_time_s\n");
    for i in 0..300 {
        csv.push_str(&format!(
            "octocat,Site{},https://site{}.example/,https://site{}.example/octocat,Claimed,200,0.1\n",
            i, i, i
        ));
    }

    c.bench_function("sherlock_report", |b| b.iter(|| parse_report(black_box(&csv))));
}

const WHOIS_RESPONSE: &str = "   Domain Name: EXAMPLE.COM
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.iana.org
   Registrar URL: http://res-dom.iana.org
   Updated Date: 2024-08-14T07:01:34Z
   Creation Date: 1995-08-14T04:00:00Z
   Registry Expiry Date: 2025-08-13T04:00:00Z
   Registrar: RESERVED-Internet Assigned Numbers Authority
   Registrar Abuse Contact Email: abuse@example.net
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
   Name Server: A.IANA-SERVERS.NET
   Name Server: B.IANA-SERVERS.NET
   DNSSEC: signedDelegation
>>> Last update of whois database: 2024-10-01T00:00:00Z <<<
";

fn benchmark_whois(c: &mut Criterion) {
    c.bench_function("whois_parse", |b| b.iter(|| parse_whois(black_box(WHOIS_RESPONSE))));
    c.bench_function("whois_referral", |b| b.iter(|| find_referral(black_box(WHOIS_RESPONSE))));
}

#[cfg(feature = "fingerprinting")]
fn benchmark_fingerprints(c: &mut Criterion) {
    use reconhub::scanners::fingerprints::{FingerprintSet, PageEvidence};

    let html = r#"<html><head>
<meta name="generator" content="WordPress 6.4.2">
<script src="/wp-includes/js/jquery/jquery-3.7.1.min.js"></script>
<script src="/_next/static/chunks/main.js"></script>
</head><body><div id="__next">hello</div></body></html>"#
        .repeat(20);
    let headers = HashMap::from([
        ("Server".to_string(), "nginx/1.24.0".to_string()),
        ("X-Powered-By".to_string(), "PHP/8.2.1".to_string()),
    ]);
    let set = FingerprintSet::builtin();

    c.bench_function("fingerprint_detect", |b| {
        b.iter(|| {
            let page = PageEvidence::new(
                "https://bench.example/",
                headers.clone(),
                vec!["PHPSESSID".to_string()],
                html.as_str(),
            );
            set.detect(black_box(&page))
        })
    });
}

#[cfg(not(feature = "fingerprinting"))]
fn benchmark_fingerprints(_c: &mut Criterion) {}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets =
        benchmark_nmap_xml,
        benchmark_asn,
        benchmark_sherlock_csv,
        benchmark_whois,
        benchmark_fingerprints
}

criterion_main!(benches);
