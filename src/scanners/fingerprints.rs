// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Technology Fingerprints
 * Wappalyzer-style rules over headers, cookies, meta tags, scripts and markup
 * © 2026 Bountyy Oy
 */

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

static SCRIPT_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<script[^>]+src\s*=\s*["']([^"']+)["']"#).expect("valid script pattern")
});

static META_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+>"#).expect("valid meta pattern")
});

static META_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:name|property)\s*=\s*["']([^"']+)["']"#).expect("valid meta name pattern")
});

static META_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)content\s*=\s*["']([^"']*)["']"#).expect("valid meta content pattern")
});

static BUILTIN: Lazy<FingerprintSet> = Lazy::new(FingerprintSet::load_builtin);

/// Everything a page exposes to fingerprinting
#[derive(Debug, Default)]
pub struct PageEvidence {
    pub url: String,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub cookies: Vec<String>,
    pub html: String,
    pub scripts: Vec<String>,
    /// Meta tag name (lowercased) to content
    pub meta: HashMap<String, String>,
}

impl PageEvidence {
    pub fn new(
        url: impl Into<String>,
        headers: HashMap<String, String>,
        cookies: Vec<String>,
        html: impl Into<String>,
    ) -> Self {
        let html = html.into();

        let scripts = SCRIPT_SRC
            .captures_iter(&html)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();

        let mut meta = HashMap::new();
        for tag in META_TAG.find_iter(&html) {
            let tag = tag.as_str();
            let name = META_NAME.captures(tag).and_then(|c| c.get(1));
            let content = META_CONTENT.captures(tag).and_then(|c| c.get(1));
            if let (Some(name), Some(content)) = (name, content) {
                meta.entry(name.as_str().to_lowercase())
                    .or_insert_with(|| content.as_str().to_string());
            }
        }

        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        Self {
            url: url.into(),
            headers,
            cookies,
            html,
            scripts,
            meta,
        }
    }
}

#[derive(Debug)]
enum Rule {
    /// Header name; a trailing '-' matches any header with that prefix
    Header { name: &'static str, pattern: Regex },
    Html(Regex),
    Script(Regex),
    /// Cookie name prefix
    Cookie(&'static str),
    Meta { name: &'static str, pattern: Regex },
    Url(Regex),
}

/// Outcome of one rule: matched, with an optional version capture
fn capture(pattern: &Regex, text: &str) -> Option<Option<String>> {
    pattern.captures(text).map(|c| {
        c.get(1)
            .map(|m| m.as_str().trim_end_matches('.').to_string())
            .filter(|v| !v.is_empty())
    })
}

impl Rule {
    fn check(&self, page: &PageEvidence) -> Option<Option<String>> {
        match self {
            Rule::Header { name, pattern } => {
                if name.ends_with('-') {
                    page.headers
                        .iter()
                        .filter(|(k, _)| k.starts_with(name))
                        .find_map(|(_, v)| capture(pattern, v))
                } else {
                    page.headers.get(*name).and_then(|v| capture(pattern, v))
                }
            }
            Rule::Html(pattern) => capture(pattern, &page.html),
            Rule::Script(pattern) => page.scripts.iter().find_map(|src| capture(pattern, src)),
            Rule::Cookie(prefix) => page
                .cookies
                .iter()
                .any(|c| c.starts_with(prefix))
                .then_some(None),
            Rule::Meta { name, pattern } => page.meta.get(*name).and_then(|v| capture(pattern, v)),
            Rule::Url(pattern) => capture(pattern, &page.url),
        }
    }
}

#[derive(Debug)]
struct Fingerprint {
    name: &'static str,
    categories: &'static [&'static str],
    rules: Vec<Rule>,
    implies: &'static [&'static str],
}

/// Versions and categories found for one technology
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Detection {
    pub versions: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

/// Rule table. Compiled once and shared across scans.
#[derive(Debug)]
pub struct FingerprintSet {
    fingerprints: Vec<Fingerprint>,
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Dropping fingerprint rule {:?}: {}", pattern, e);
            None
        }
    }
}

fn header(name: &'static str, pattern: &str) -> Option<Rule> {
    compile(pattern).map(|pattern| Rule::Header { name, pattern })
}

fn html(pattern: &str) -> Option<Rule> {
    compile(pattern).map(Rule::Html)
}

fn script(pattern: &str) -> Option<Rule> {
    compile(pattern).map(Rule::Script)
}

fn cookie(prefix: &'static str) -> Option<Rule> {
    Some(Rule::Cookie(prefix))
}

fn meta(name: &'static str, pattern: &str) -> Option<Rule> {
    compile(pattern).map(|pattern| Rule::Meta { name, pattern })
}

fn url(pattern: &str) -> Option<Rule> {
    compile(pattern).map(Rule::Url)
}

const JS_FRAMEWORKS: &[&str] = &["JavaScript frameworks"];
const JS_LIBRARIES: &[&str] = &["JavaScript libraries"];
const CMS: &[&str] = &["CMS"];
const WEB_SERVERS: &[&str] = &["Web servers"];
const CDN: &[&str] = &["CDN"];
const ANALYTICS: &[&str] = &["Analytics"];
const SECURITY: &[&str] = &["Security"];
const LANGUAGES: &[&str] = &["Programming languages"];
const PAAS: &[&str] = &["PaaS"];
const UI_FRAMEWORKS: &[&str] = &["UI frameworks"];
const PAYMENT: &[&str] = &["Payment processors"];
const CONTAINERS: &[&str] = &["Containers"];
const DATABASES: &[&str] = &["Databases"];

impl FingerprintSet {
    /// Shared built-in rule table
    pub fn builtin() -> &'static FingerprintSet {
        &BUILTIN
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    fn add(
        &mut self,
        name: &'static str,
        categories: &'static [&'static str],
        rules: Vec<Option<Rule>>,
        implies: &'static [&'static str],
    ) {
        self.fingerprints.push(Fingerprint {
            name,
            categories,
            rules: rules.into_iter().flatten().collect(),
            implies,
        });
    }

    fn load_builtin() -> Self {
        let mut set = Self { fingerprints: Vec::new() };

        set.add("React", JS_FRAMEWORKS, vec![
            script(r"react(?:-dom)?(?:\.production)?(?:\.min)?\.js"),
            html(r"data-reactroot"),
        ], &["JavaScript"]);
        set.add("Vue.js", JS_FRAMEWORKS, vec![
            script(r"vue(?:\.runtime)?(?:\.min)?\.js"),
            html(r"data-v-[0-9a-f]{8}"),
        ], &["JavaScript"]);
        set.add("Angular", JS_FRAMEWORKS, vec![
            html(r#"ng-version="([\d.]+)""#),
            script(r"angular(?:\.min)?\.js"),
        ], &["JavaScript"]);
        set.add("Next.js", JS_FRAMEWORKS, vec![
            html(r"__NEXT_DATA__"),
            script(r"/_next/static/"),
            header("x-powered-by", r"Next\.js ?([\d.]+)?"),
        ], &["React", "Node.js"]);

        set.add("WordPress", CMS, vec![
            html(r"/wp-(?:content|includes)/"),
            meta("generator", r"WordPress ?([\d.]+)?"),
            header("link", r"rel=.https://api\.w\.org/"),
        ], &["PHP", "MySQL"]);
        set.add("Drupal", CMS, vec![
            header("x-generator", r"Drupal ?([\d.]+)?"),
            meta("generator", r"Drupal ?([\d.]+)?"),
            html(r"sites/(?:default|all)/(?:themes|modules)/"),
        ], &["PHP"]);
        set.add("Joomla", CMS, vec![
            meta("generator", r"Joomla!? ?([\d.]+)?"),
            html(r"/media/system/js/"),
        ], &["PHP"]);

        set.add("Nginx", WEB_SERVERS, vec![header("server", r"nginx(?:/([\d.]+))?")], &[]);
        set.add("Apache HTTP Server", WEB_SERVERS, vec![
            header("server", r"Apache(?:/([\d.]+))?"),
        ], &[]);
        set.add("Microsoft IIS", WEB_SERVERS, vec![
            header("server", r"Microsoft-IIS(?:/([\d.]+))?"),
        ], &[]);
        set.add("LiteSpeed", WEB_SERVERS, vec![header("server", r"LiteSpeed")], &[]);

        set.add("Cloudflare", CDN, vec![
            header("server", r"cloudflare"),
            header("cf-ray", r".+"),
            cookie("__cf_bm"),
            cookie("__cfduid"),
        ], &[]);
        set.add("Akamai", CDN, vec![
            header("x-akamai-transformed", r".+"),
            header("x-akamai-staging", r".+"),
        ], &[]);
        set.add("Fastly", CDN, vec![
            header("x-served-by", r"cache-"),
            header("fastly-io-info", r".+"),
        ], &[]);
        set.add("Amazon CloudFront", CDN, vec![
            header("x-amz-cf-id", r".+"),
            header("via", r"CloudFront"),
        ], &["Amazon Web Services"]);

        set.add("Google Analytics", ANALYTICS, vec![
            script(r"google-analytics\.com/(?:ga|urchin|analytics)\.js"),
            script(r"googletagmanager\.com/gtag/js"),
        ], &[]);
        set.add("Hotjar", ANALYTICS, vec![script(r"static\.hotjar\.com")], &[]);
        set.add("Mixpanel", ANALYTICS, vec![script(r"mixpanel\.com/libs/mixpanel")], &[]);

        set.add("reCAPTCHA", SECURITY, vec![
            script(r"(?:google|recaptcha)\.(?:com|net)/recaptcha"),
            html(r"g-recaptcha"),
        ], &[]);
        set.add("Imperva", SECURITY, vec![cookie("incap_ses_"), cookie("visid_incap_")], &[]);
        set.add("HSTS", SECURITY, vec![header("strict-transport-security", r".+")], &[]);

        set.add("PHP", LANGUAGES, vec![
            header("x-powered-by", r"PHP(?:/([\d.]+))?"),
            cookie("PHPSESSID"),
            url(r"\.php(?:\?|$)"),
        ], &[]);
        set.add("Node.js", LANGUAGES, vec![], &[]);
        set.add("Express", JS_FRAMEWORKS, vec![header("x-powered-by", r"^Express$")], &["Node.js"]);
        set.add("Python", LANGUAGES, vec![header("server", r"Python(?:/([\d.]+))?")], &[]);
        set.add("Django", JS_FRAMEWORKS, vec![cookie("csrftoken"), cookie("django_language")], &["Python"]);
        set.add("Ruby on Rails", JS_FRAMEWORKS, vec![
            cookie("_rails_session"),
            header("x-powered-by", r"Phusion Passenger|mod_rails|mod_rack"),
        ], &["Ruby"]);
        set.add("Ruby", LANGUAGES, vec![], &[]);
        set.add("JavaScript", LANGUAGES, vec![], &[]);

        set.add("Amazon Web Services", PAAS, vec![
            header("server", r"AmazonS3"),
            header("x-amz-", r".+"),
        ], &[]);
        set.add("Google Cloud", PAAS, vec![
            header("server", r"Google Frontend"),
            header("x-goog-", r".+"),
        ], &[]);
        set.add("Microsoft Azure", PAAS, vec![header("x-azure-ref", r".+"), header("x-ms-", r".+")], &[]);

        set.add("jQuery", JS_LIBRARIES, vec![
            script(r"jquery[.-]?([\d.]+)?(?:\.min)?\.js"),
        ], &["JavaScript"]);
        set.add("Bootstrap", UI_FRAMEWORKS, vec![
            html(r"bootstrap(?:\.min)?\.css"),
            script(r"bootstrap(?:\.bundle)?(?:\.min)?\.js"),
        ], &[]);

        set.add("Stripe", PAYMENT, vec![script(r"js\.stripe\.com")], &[]);
        set.add("PayPal", PAYMENT, vec![script(r"paypal\.com/sdk"), html(r"paypal-button")], &[]);

        set.add("Docker", CONTAINERS, vec![header("server", r"Docker")], &[]);
        set.add("Kubernetes", CONTAINERS, vec![header("server", r"Kubernetes")], &[]);
        set.add("MySQL", DATABASES, vec![], &[]);

        set
    }

    /// Match every rule against the page. Implied technologies are added
    /// with their own categories and no version.
    pub fn detect(&self, page: &PageEvidence) -> BTreeMap<String, Detection> {
        let mut found: BTreeMap<String, Detection> = BTreeMap::new();

        for fp in &self.fingerprints {
            let mut matched = false;
            let mut versions = BTreeSet::new();

            for rule in &fp.rules {
                if let Some(version) = rule.check(page) {
                    matched = true;
                    versions.extend(version);
                }
            }

            if matched {
                found.insert(fp.name.to_string(), self.detection(fp, versions));
            }
        }

        // implications can chain (Next.js -> React -> JavaScript)
        let mut pending: Vec<&'static str> = self
            .fingerprints
            .iter()
            .filter(|fp| found.contains_key(fp.name))
            .flat_map(|fp| fp.implies.iter().copied())
            .collect();

        while let Some(name) = pending.pop() {
            if found.contains_key(name) {
                continue;
            }
            let detection = match self.fingerprints.iter().find(|fp| fp.name == name) {
                Some(fp) => {
                    pending.extend(fp.implies.iter().copied());
                    self.detection(fp, BTreeSet::new())
                }
                None => Detection::default(),
            };
            found.insert(name.to_string(), detection);
        }

        found
    }

    fn detection(&self, fp: &Fingerprint, versions: BTreeSet<String>) -> Detection {
        Detection {
            versions,
            categories: fp.categories.iter().map(|c| c.to_string()).collect(),
        }
    }
}
