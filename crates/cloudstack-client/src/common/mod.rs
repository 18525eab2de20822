//! Common utilities for the CloudStack API client
//!
//! CloudStack exposes a single endpoint; every call is a GET carrying a `command`
//! parameter. Responses are wrapped in a `<command>response` envelope. Asynchronous
//! commands return a `jobid` that is polled with `queryAsyncJobResult`.

pub mod query;

use crate::config::ClientConfig;
use crate::error::CloudStackError;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const JOB_PENDING: i64 = 0;
const JOB_SUCCEEDED: i64 = 1;

/// HTTP transport for the CloudStack API
///
/// Requests carry the API key but are not signed with the secret key, so the endpoint
/// must be a signing proxy in front of CloudStack rather than CloudStack itself.
#[derive(Debug, Clone)]
pub struct ApiTransport {
    client: Client,
    config: ClientConfig,
    poll_interval: Duration,
    max_polls: u32,
}

impl ApiTransport {
    /// Create a transport for the given endpoint
    pub fn new(config: ClientConfig) -> Result<Self, CloudStackError> {
        if config.api_url.is_empty() {
            return Err(CloudStackError::Configuration("api url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self {
            client,
            config,
            poll_interval: Duration::from_secs(2),
            max_polls: 150,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Build the request URL for a command
    ///
    /// Parameters with empty values are dropped.
    pub fn build_url<K: AsRef<str>>(&self, command: &str, params: &[(K, String)]) -> String {
        let mut pairs = vec![format!("command={}", urlencoding::encode(command))];
        for (key, value) in params {
            if value.is_empty() {
                continue;
            }
            pairs.push(format!("{}={}", key.as_ref(), urlencoding::encode(value)));
        }
        pairs.push(format!("apiKey={}", urlencoding::encode(&self.config.api_key)));
        pairs.push("response=json".to_string());
        format!("{}?{}", self.config.api_url, pairs.join("&"))
    }

    /// Execute a synchronous command and return the unwrapped response body
    pub async fn call<K: AsRef<str>>(&self, command: &str, params: &[(K, String)]) -> Result<Value, CloudStackError> {
        let url = self.build_url(command, params);
        debug!("CloudStack {}", command);

        let response = self.client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            // CloudStack reports errors inside the envelope with a non-2xx status
            return Err(match unwrap_envelope(&body) {
                Err(err @ CloudStackError::Api { .. }) => err,
                _ => CloudStackError::api(status.as_u16(), format!("{} failed: {}", command, body)),
            });
        }

        unwrap_envelope(&body)
    }

    /// Execute an asynchronous command and wait for its job result
    pub async fn call_async<K: AsRef<str>>(&self, command: &str, params: &[(K, String)]) -> Result<Value, CloudStackError> {
        let accepted = self.call(command, params).await?;
        let Some(job_id) = accepted.get("jobid").and_then(Value::as_str) else {
            // Some deployments answer synchronously
            return Ok(accepted);
        };
        let job_id = job_id.to_string();

        for _ in 0..self.max_polls {
            let job = self
                .call("queryAsyncJobResult", &[("jobid", job_id.clone())])
                .await?;
            if let Some(result) = job_outcome(&job)? {
                return Ok(result);
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(CloudStackError::JobTimeout(job_id))
    }
}

/// Strip the `<command>response` envelope, surfacing embedded API errors
pub fn unwrap_envelope(body: &str) -> Result<Value, CloudStackError> {
    let parsed: Value = serde_json::from_str(body)?;
    let inner = match parsed {
        Value::Object(map) if map.len() == 1 => map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null),
        other => other,
    };

    if let Some(err) = embedded_error(&inner) {
        return Err(err);
    }
    Ok(inner)
}

/// Interpret a `queryAsyncJobResult` body: `None` while the job is pending.
pub fn job_outcome(job: &Value) -> Result<Option<Value>, CloudStackError> {
    let status = job.get("jobstatus").and_then(Value::as_i64).unwrap_or(JOB_PENDING);
    let result = job.get("jobresult").cloned().unwrap_or(Value::Null);
    match status {
        JOB_PENDING => Ok(None),
        JOB_SUCCEEDED => Ok(Some(result)),
        _ => Err(embedded_error(&result).unwrap_or_else(|| {
            CloudStackError::api(530, format!("async job failed: {}", result))
        })),
    }
}

fn embedded_error(value: &Value) -> Option<CloudStackError> {
    let code = value.get("errorcode")?.as_u64()?;
    let text = value
        .get("errortext")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(CloudStackError::api(u16::try_from(code).unwrap_or(530), text))
}
