/// Execution Engine - Client for the Remote Execution Capability
///
/// **Core Responsibility:**
/// Send source code plus stdin to the external runner and bring back raw output.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to reach the runner (HTTP, credentials, timeouts)
/// - Engine does NOT know scoring rules
/// - Engine does NOT compare output
/// - Every failure is translated into `ExecutionError`; callers decide what it means
///
/// **Timeouts:**
/// Each call is wrapped in a hard `tokio::time::timeout`, so one slow test case
/// cannot hold a submission hostage.

use arbiter_common::config::{ExecutionConfig, LanguageTable};
use arbiter_common::types::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One execution: program, language and the stdin to feed it
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub code: &'a str,
    pub language: Language,
    pub stdin: &'a str,
}

/// Successful run as reported by the capability
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    pub output: String,
    pub memory: Option<String>,
    pub cpu_time: Option<String>,
}

impl ExecutionOutput {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            memory: None,
            cpu_time: None,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("execution service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("execution service reported an error: {0}")]
    Remote(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ExecutionError {
    /// Failures worth another attempt: the program never got a fair run
    pub fn is_retryable(&self) -> bool {
        match self {
            ExecutionError::Timeout(_) | ExecutionError::Transport(_) => true,
            ExecutionError::Status { status, .. } => *status == 429 || *status >= 500,
            ExecutionError::Remote(_) | ExecutionError::MalformedResponse(_) => false,
        }
    }
}

/// Anything that can run code for the evaluator
///
/// Implementations must bound their own latency.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutput, ExecutionError>;
}

#[async_trait]
impl<T: ExecutionClient + ?Sized> ExecutionClient for Arc<T> {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutput, ExecutionError> {
        (**self).execute(request).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteBody<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    script: &'a str,
    stdin: &'a str,
    language: String,
    version_index: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteReply {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    memory: Option<serde_json::Value>,
    #[serde(default)]
    cpu_time: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// JDoodle-compatible HTTP client
///
/// Holds its own `reqwest::Client`; clone it freely, clones share the pool.
#[derive(Clone)]
pub struct HttpExecutionClient {
    http: reqwest::Client,
    config: ExecutionConfig,
    languages: LanguageTable,
}

impl HttpExecutionClient {
    pub fn new(config: ExecutionConfig, languages: LanguageTable) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config, languages })
    }

    async fn send(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutput, ExecutionError> {
        let body = ExecuteBody {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            script: request.code,
            stdin: request.stdin,
            language: request.language.to_string(),
            version_index: self.languages.version_index(request.language),
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(ExecutionError::Status {
                status: status.as_u16(),
                body: truncate(&text, 512),
            });
        }

        let reply: ExecuteReply = serde_json::from_str(&text)
            .map_err(|e| ExecutionError::MalformedResponse(e.to_string()))?;

        if let Some(error) = reply.error {
            return Err(ExecutionError::Remote(error));
        }
        if let Some(code) = reply.status_code {
            if code != 200 {
                return Err(ExecutionError::Remote(format!("status code {}", code)));
            }
        }

        let output = reply
            .output
            .ok_or_else(|| ExecutionError::MalformedResponse("missing output field".to_string()))?;

        Ok(ExecutionOutput {
            output,
            memory: reply.memory.and_then(value_to_string),
            cpu_time: reply.cpu_time.and_then(value_to_string),
        })
    }

    fn classify(&self, err: reqwest::Error) -> ExecutionError {
        if err.is_timeout() {
            ExecutionError::Timeout(self.config.timeout)
        } else {
            ExecutionError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ExecutionClient for HttpExecutionClient {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutput, ExecutionError> {
        debug!(
            language = %request.language,
            source_size = request.code.len(),
            stdin_size = request.stdin.len(),
            "Dispatching execution"
        );

        // HARD TIMEOUT: covers connect, request and body read
        match tokio::time::timeout(self.config.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ExecutionError::Timeout(self.config.timeout)),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.retry_backoff,
            max_backoff: Duration::from_secs(5),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Wraps any client and retries retryable failures
///
/// Same contract as the inner client: one call in, one result out.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: ExecutionClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C: ExecutionClient> ExecutionClient for RetryingClient<C> {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutput, ExecutionError> {
        let mut attempt = 0;
        loop {
            match self.inner.execute(request).await {
                Ok(output) => return Ok(output),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    attempt += 1;
                    warn!(
                        error = %e,
                        attempt,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Execution failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Build the production client stack from configuration
pub fn client_from_config(
    config: ExecutionConfig,
    languages: LanguageTable,
) -> anyhow::Result<Arc<dyn ExecutionClient>> {
    let policy = RetryPolicy::from_config(&config);
    let http = HttpExecutionClient::new(config, languages)?;

    if policy.max_retries == 0 {
        Ok(Arc::new(http))
    } else {
        Ok(Arc::new(RetryingClient::new(http, policy)))
    }
}
