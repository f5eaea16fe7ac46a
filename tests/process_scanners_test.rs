#![cfg(unix)]

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - External Tool Scanner Tests
 * nmap, subfinder and sherlock driven through shell-script stand-ins
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use reconhub::scanners::{NmapScanner, Scanner, SherlockScanner, SubdomainScanner};
use reconhub::types::ScanResult;
use serde_json::json;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const NMAP_XML: &str = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
<host><status state="up" reason="echo-reply"/>
<address addr="192.0.2.10" addrtype="ipv4"/>
<hostnames><hostname name="scanme.example" type="user"/></hostnames>
<ports><port protocol="tcp" portid="22"><state state="open" reason="syn-ack"/><service name="ssh" product="OpenSSH" version="9.6"/></port></ports>
</host>
</nmaprun>"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

struct Fixture {
    bin: TempDir,
    scratch: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            bin: tempfile::tempdir().unwrap(),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    fn tool(&self, name: &str, body: &str) -> String {
        script(self.bin.path(), name, body).display().to_string()
    }

    fn missing(&self, name: &str) -> String {
        self.bin.path().join(name).display().to_string()
    }

    fn scratch_entries(&self) -> usize {
        entries(self.scratch.path())
    }
}

// -------------------------------------------------------------------- nmap

#[tokio::test]
async fn test_nmap_parses_tool_report() {
    let fx = Fixture::new();
    let nmap = fx.tool("nmap", &format!("cat <<'XML'\n{}\nXML", NMAP_XML));

    let scanner = NmapScanner::new(nmap, Duration::from_secs(10));
    let data = scanner.execute("scanme.example").await.unwrap();

    assert_eq!(data["resolved_ip"], "192.0.2.10");
    assert_eq!(data["tcp"]["22"]["product"], "OpenSSH");
    assert_eq!(data["status"]["state"], "up");
}

#[tokio::test]
async fn test_nmap_receives_fast_scan_arguments() {
    let fx = Fixture::new();
    let log = fx.bin.path().join("args.txt");
    let nmap = fx.tool(
        "nmap",
        &format!(
            "echo \"$@\" > '{}'\ncat <<'XML'\n{}\nXML",
            log.display(),
            NMAP_XML
        ),
    );

    NmapScanner::new(nmap, Duration::from_secs(10))
        .execute("192.0.2.10")
        .await
        .unwrap();

    let args = std::fs::read_to_string(&log).unwrap();
    assert_eq!(args.trim(), "-F -oX - 192.0.2.10");
}

#[tokio::test]
async fn test_nmap_zero_budget_times_out() {
    let fx = Fixture::new();
    let nmap = fx.tool("nmap", "sleep 5");

    let scanner = NmapScanner::new(nmap, Duration::ZERO);
    let result = ScanResult::from(scanner.execute("192.0.2.10").await);

    assert_eq!(result.error(), Some("nmap scan timed out after 0s"));
}

#[tokio::test]
async fn test_nmap_missing_binary() {
    let fx = Fixture::new();
    let scanner = NmapScanner::new(fx.missing("nmap"), Duration::from_secs(10));
    let result = ScanResult::from(scanner.execute("192.0.2.10").await);

    assert_eq!(result.into_value(), json!({"error": "nmap tool not found in system path"}));
}

#[tokio::test]
async fn test_nmap_nonzero_exit_reports_stderr() {
    let fx = Fixture::new();
    let nmap = fx.tool("nmap", "echo 'Failed to resolve \"nope\".' >&2\nexit 1");

    let result = ScanResult::from(
        NmapScanner::new(nmap, Duration::from_secs(10))
            .execute("nope")
            .await,
    );
    assert_eq!(result.error(), Some("nmap failed: Failed to resolve \"nope\"."));
}

#[tokio::test]
async fn test_nmap_option_like_target_never_spawns() {
    let fx = Fixture::new();
    let marker = fx.bin.path().join("ran");
    let nmap = fx.tool("nmap", &format!("touch '{}'", marker.display()));

    let result = ScanResult::from(
        NmapScanner::new(nmap, Duration::from_secs(10))
            .execute("--script=evil")
            .await,
    );
    assert!(result.is_error());
    assert!(!marker.exists());
}

// --------------------------------------------------------------- subfinder

const SUBFINDER: &str = "printf 'www.%s\\napi.%s\\n' \"$2\" \"$2\" > \"$5\"";

#[tokio::test]
async fn test_subfinder_results_and_cleanup() {
    let fx = Fixture::new();
    let subfinder = fx.tool("subfinder", SUBFINDER);

    let scanner = SubdomainScanner::new(subfinder, fx.scratch.path(), Duration::from_secs(10));
    let data = scanner.execute("example.com").await.unwrap();

    assert_eq!(data["subdomains"], json!(["www.example.com", "api.example.com"]));
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_subfinder_timeout_removes_scratch() {
    let fx = Fixture::new();
    let subfinder = fx.tool("subfinder", "sleep 5");

    let scanner = SubdomainScanner::new(subfinder, fx.scratch.path(), Duration::ZERO);
    let result = ScanResult::from(scanner.execute("example.com").await);

    assert_eq!(result.error(), Some("subfinder scan timed out after 0s"));
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_subfinder_missing_binary_creates_no_scratch() {
    let fx = Fixture::new();
    let scanner = SubdomainScanner::new(
        fx.missing("subfinder"),
        fx.scratch.path(),
        Duration::from_secs(10),
    );
    let result = ScanResult::from(scanner.execute("example.com").await);

    assert_eq!(result.error(), Some("subfinder tool not found in system path"));
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_subfinder_without_output_file_is_empty() {
    let fx = Fixture::new();
    let subfinder = fx.tool("subfinder", "exit 0");

    let scanner = SubdomainScanner::new(subfinder, fx.scratch.path(), Duration::from_secs(10));
    let data = scanner.execute("quiet.example").await.unwrap();
    assert_eq!(data["subdomains"], json!([]));
}

#[tokio::test]
async fn test_concurrent_subfinder_runs_stay_isolated() {
    let fx = Fixture::new();
    // a short sleep keeps both invocations alive at the same time
    let subfinder = fx.tool(
        "subfinder",
        "sleep 0.2\nprintf 'www.%s\\n' \"$2\" > \"$5\"",
    );
    let scanner = SubdomainScanner::new(subfinder, fx.scratch.path(), Duration::from_secs(10));

    let (a, b) = tokio::join!(scanner.execute("alpha.example"), scanner.execute("beta.example"));

    assert_eq!(a.unwrap()["subdomains"], json!(["www.alpha.example"]));
    assert_eq!(b.unwrap()["subdomains"], json!(["www.beta.example"]));
    assert_eq!(fx.scratch_entries(), 0);
}

// ---------------------------------------------------------------- sherlock

const SHERLOCK: &str = r#"out="$7/$1.csv"
echo "username,name,url_main,url_user,exists,http_status,response_time_s" > "$out"
echo "$1,GitHub,https://www.github.com/,https://www.github.com/$1,Claimed,200,0.2" >> "$out"
echo "$1,Keybase,https://keybase.io/,https://keybase.io/$1,Claimed,200,0.3" >> "$out""#;

#[tokio::test]
async fn test_sherlock_report() {
    let fx = Fixture::new();
    let sherlock = fx.tool("sherlock", SHERLOCK);

    let scanner = SherlockScanner::new(sherlock, fx.scratch.path(), Duration::from_secs(10));
    let data = scanner.execute("octocat").await.unwrap();

    assert_eq!(
        data["sherlock_data"],
        json!({
            "GitHub": "https://www.github.com/octocat",
            "Keybase": "https://keybase.io/octocat"
        })
    );
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_sherlock_no_report() {
    let fx = Fixture::new();
    let sherlock = fx.tool("sherlock", "exit 0");

    let scanner = SherlockScanner::new(sherlock, fx.scratch.path(), Duration::from_secs(10));
    let data = scanner.execute("nobody_here").await.unwrap();

    assert_eq!(data["sherlock_data"], json!({}));
    assert_eq!(data["message"], "No accounts found or file not created");
}

#[tokio::test]
async fn test_sherlock_rejects_spaces_before_tool_lookup() {
    let fx = Fixture::new();
    let scanner = SherlockScanner::new(
        fx.missing("sherlock"),
        fx.scratch.path(),
        Duration::from_secs(10),
    );
    let result = ScanResult::from(scanner.execute("john doe").await);

    assert_eq!(result.error(), Some("Invalid username (no spaces allowed)"));
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_sherlock_zero_budget() {
    let fx = Fixture::new();
    let sherlock = fx.tool("sherlock", "sleep 5");

    let scanner = SherlockScanner::new(sherlock, fx.scratch.path(), Duration::ZERO);
    let result = ScanResult::from(scanner.execute("octocat").await);

    assert_eq!(result.error(), Some("Sherlock scan timed out after 0s"));
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_sherlock_missing_binary() {
    let fx = Fixture::new();
    let scanner = SherlockScanner::new(
        fx.missing("sherlock"),
        fx.scratch.path(),
        Duration::from_secs(10),
    );
    let result = ScanResult::from(scanner.execute("octocat").await);

    assert_eq!(
        result.into_value(),
        json!({"error": "Sherlock tool not found in system path"})
    );
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_concurrent_sherlock_runs_stay_isolated() {
    let fx = Fixture::new();
    // both runs are in flight together; each only sees its own folder
    let sherlock = fx.tool(
        "sherlock",
        r#"sleep 0.2
ls "$7" | grep -q . && exit 3
echo "username,name,url_user" > "$7/$1.csv"
echo "$1,GitHub,https://www.github.com/$1" >> "$7/$1.csv""#,
    );
    let scanner = SherlockScanner::new(sherlock, fx.scratch.path(), Duration::from_secs(10));

    let (a, b) = tokio::join!(scanner.execute("alice"), scanner.execute("bob"));

    assert_eq!(
        a.unwrap()["sherlock_data"],
        json!({"GitHub": "https://www.github.com/alice"})
    );
    assert_eq!(
        b.unwrap()["sherlock_data"],
        json!({"GitHub": "https://www.github.com/bob"})
    );
    assert_eq!(fx.scratch_entries(), 0);
}

#[tokio::test]
async fn test_mixed_tool_scanners_run_concurrently() {
    let fx = Fixture::new();
    let nmap = fx.tool("nmap", &format!("sleep 0.2\ncat <<'XML'\n{}\nXML", NMAP_XML));
    let subfinder = fx.tool("subfinder", &format!("sleep 0.2\n{}", SUBFINDER));
    let sherlock = fx.tool("sherlock", &format!("sleep 0.2\n{}", SHERLOCK));
    let budget = Duration::from_secs(10);

    let nmap = NmapScanner::new(nmap, budget);
    let subfinder = SubdomainScanner::new(subfinder, fx.scratch.path(), budget);
    let sherlock = SherlockScanner::new(sherlock, fx.scratch.path(), budget);

    let (ports, subs, accounts) = tokio::join!(
        nmap.execute("192.0.2.10"),
        subfinder.execute("example.org"),
        sherlock.execute("octocat"),
    );

    assert!(!ports.unwrap().contains_key("resolved_ip"));
    assert_eq!(subs.unwrap()["subdomains"], json!(["www.example.org", "api.example.org"]));
    assert_eq!(
        accounts.unwrap()["sherlock_data"]["GitHub"],
        "https://www.github.com/octocat"
    );
    assert_eq!(fx.scratch_entries(), 0);
}
