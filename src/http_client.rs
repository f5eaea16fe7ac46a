// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_POOL_IDLE_PER_HOST: usize = 8;
const DEFAULT_POOL_MAX_IDLE_TIMEOUT: u64 = 90;

/// Shared HTTP client for the remote-query scanners.
///
/// Every call carries its own timeout, so one client serves scanners with
/// different budgets.
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    max_body_size: usize,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .pool_max_idle_per_host(DEFAULT_POOL_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(DEFAULT_POOL_MAX_IDLE_TIMEOUT))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            max_body_size: MAX_BODY_SIZE,
        })
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// GET a URL with a per-request timeout
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        self.read_response(response, start).await
    }

    /// POST a JSON body with a per-request timeout
    pub async fn post_json(
        &self,
        url: &str,
        json: &serde_json::Value,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(json)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        self.read_response(response, start).await
    }

    async fn read_response(
        &self,
        response: reqwest::Response,
        start: Instant,
    ) -> Result<HttpResponse> {
        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();

        let mut headers = HashMap::new();
        let mut cookies = Vec::new();
        for (name, value) in response.headers() {
            let value = value.to_str().unwrap_or("").to_string();
            if name == reqwest::header::SET_COOKIE {
                cookies.push(value.clone());
            }
            headers.insert(name.as_str().to_lowercase(), value);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        let body = if bytes.len() > self.max_body_size {
            debug!(
                "Response body truncated from {} to {} bytes",
                bytes.len(),
                self.max_body_size
            );
            String::from_utf8_lossy(&bytes[..self.max_body_size]).into_owned()
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        Ok(HttpResponse {
            status_code,
            body,
            headers,
            cookies,
            final_url,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    /// Raw `Set-Cookie` values in arrival order
    pub cookies: Vec<String>,
    pub final_url: String,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_lowercase()).cloned()
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.body).context("Response body is not valid JSON")
    }

    /// Cookie names set by the response
    pub fn cookie_names(&self) -> Vec<String> {
        self.cookies
            .iter()
            .filter_map(|c| c.split(';').next())
            .filter_map(|pair| pair.split('=').next())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_cookies(cookies: &[&str]) -> HttpResponse {
        HttpResponse {
            status_code: 200,
            body: String::new(),
            headers: HashMap::new(),
            cookies: cookies.iter().map(|c| c.to_string()).collect(),
            final_url: "https://example.com/".to_string(),
            duration_ms: 0,
        }
    }

    #[test]
    fn test_cookie_names() {
        let response = response_with_cookies(&["PHPSESSID=abc; path=/", "_ga=GA1.2; Secure"]);
        assert_eq!(response.cookie_names(), vec!["PHPSESSID", "_ga"]);
    }

    #[test]
    fn test_success_range() {
        let mut response = response_with_cookies(&[]);
        assert!(response.is_success());
        response.status_code = 404;
        assert!(!response.is_success());
    }
}
