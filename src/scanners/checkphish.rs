// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * CheckPhish Scanner
 * Submit-then-poll phishing verdict lookup
 * © 2026 Bountyy Oy
 */

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Scanner;
use crate::errors::ScanFailure;
use crate::http_client::HttpClient;
use crate::types::{ScanData, ScanOutcome, ScanType};

pub const PENDING_MESSAGE: &str = "Scan initiated but pending completion";

/// Source of the delay between status polls
#[async_trait]
pub trait PollClock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock delays
pub struct TokioClock;

#[async_trait]
impl PollClock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Job lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Submitted { job_id: String, submission: ScanData },
    Polling { job_id: String, submission: ScanData, attempt: u32 },
    Done(ScanData),
    TimedOut(ScanData),
}

impl PollState {
    /// State right after the submit call returned
    pub fn after_submit(submission: ScanData) -> Self {
        let job_id = match submission.get("jobID") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        match job_id {
            Some(job_id) => PollState::Submitted { job_id, submission },
            None => PollState::Done(verdict(submission)),
        }
    }
}

/// `{"disposition": d}` when the reply carries one, else the whole reply
fn verdict(mut data: ScanData) -> ScanData {
    match data.remove("disposition") {
        Some(disposition) => {
            let mut result = ScanData::new();
            result.insert("disposition".to_string(), disposition);
            result
        }
        None => data,
    }
}

pub struct CheckPhishScanner {
    http: HttpClient,
    api_base: String,
    api_key: Option<String>,
    submit_timeout: Duration,
    poll_timeout: Duration,
    poll_interval: Duration,
    max_attempts: u32,
    clock: Arc<dyn PollClock>,
}

impl CheckPhishScanner {
    pub fn new(http: HttpClient, api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            submit_timeout: Duration::from_secs(15),
            poll_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(3),
            max_attempts: 10,
            clock: Arc::new(TokioClock),
        }
    }

    pub fn with_timeouts(mut self, submit: Duration, poll: Duration) -> Self {
        self.submit_timeout = submit;
        self.poll_timeout = poll;
        self
    }

    pub fn with_polling(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.poll_interval = interval;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn PollClock>) -> Self {
        self.clock = clock;
        self
    }

    async fn submit(&self, api_key: &str, target: &str) -> Result<ScanData, ScanFailure> {
        let url = format!("{}/scan", self.api_base);
        let payload = json!({
            "apiKey": api_key,
            "urlInfo": { "url": target },
        });

        let response = self
            .http
            .post_json(&url, &payload, self.submit_timeout)
            .await
            .map_err(|e| ScanFailure::from_http(&e))?;

        if !response.is_success() {
            return Err(ScanFailure::ExternalService(format!(
                "CheckPhish returned HTTP {}",
                response.status_code
            )));
        }

        match response.json() {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ScanFailure::parse("CheckPhish reply", "expected a JSON object")),
            Err(e) => Err(ScanFailure::parse("CheckPhish reply", e)),
        }
    }

    /// One status query. Anything short of a finished job yields `None`.
    async fn poll_once(&self, api_key: &str, job_id: &str) -> Option<ScanData> {
        let url = format!("{}/scan/status", self.api_base);
        let payload = json!({
            "apiKey": api_key,
            "jobID": job_id,
            "insights": true,
        });

        let response = match self.http.post_json(&url, &payload, self.poll_timeout).await {
            Ok(response) => response,
            Err(e) => {
                debug!("CheckPhish status poll failed: {:#}", e);
                return None;
            }
        };

        if response.status_code != 200 {
            debug!("CheckPhish status poll returned HTTP {}", response.status_code);
            return None;
        }

        match response.json() {
            Ok(Value::Object(status)) => {
                if status.get("status").and_then(Value::as_str) == Some("DONE") {
                    Some(verdict(status))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    async fn advance(&self, api_key: &str, state: PollState) -> PollState {
        match state {
            PollState::Submitted { job_id, submission } => {
                info!("CheckPhish job {} submitted", job_id);
                PollState::Polling {
                    job_id,
                    submission,
                    attempt: 0,
                }
            }
            PollState::Polling { submission, attempt, .. } if attempt >= self.max_attempts => {
                warn!("CheckPhish job still pending after {} polls", attempt);
                PollState::TimedOut(submission)
            }
            PollState::Polling {
                job_id,
                submission,
                attempt,
            } => {
                self.clock.sleep(self.poll_interval).await;
                match self.poll_once(api_key, &job_id).await {
                    Some(done) => PollState::Done(done),
                    None => PollState::Polling {
                        job_id,
                        submission,
                        attempt: attempt + 1,
                    },
                }
            }
            terminal => terminal,
        }
    }
}

#[async_trait]
impl Scanner for CheckPhishScanner {
    fn scan_type(&self) -> ScanType {
        ScanType::Checkphish
    }

    fn budget(&self) -> Option<Duration> {
        Some(
            self.submit_timeout
                + (self.poll_interval + self.poll_timeout) * self.max_attempts,
        )
    }

    async fn execute(&self, target: &str) -> ScanOutcome {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ScanFailure::NotConfigured("CheckPhish API key not configured".to_string())
        })?;

        let submission = self.submit(api_key, target.trim()).await?;
        let mut state = PollState::after_submit(submission);

        loop {
            state = match state {
                PollState::Done(data) => return Ok(data),
                PollState::TimedOut(mut data) => {
                    data.insert(
                        "message".to_string(),
                        Value::String(PENDING_MESSAGE.to_string()),
                    );
                    return Ok(data);
                }
                other => self.advance(api_key, other).await,
            };
        }
    }
}
