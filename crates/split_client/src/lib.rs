//! HTTP committer for split sessions.
//!
//! The client never mutates the session: it asks the engine for a
//! [`PreparedCommit`](engine::PreparedCommit), posts it to the order service
//! and verifies the answer. A failed commit can be retried as is.

use std::time::Duration;

use api_types::{ErrorResponse, split::SplitResponse};
use base64::Engine;
use engine::{EngineError, IntegrityIssue, PreparedCommit, SplitSession};
use reqwest::{Client, StatusCode, Url, header};

pub use wire::CommitRequest;

mod wire;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const IDEMPOTENCY_KEY: &str = "idempotency-key";

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("split blocked by {} integrity issue(s)", .0.len())]
    Integrity(Vec<IntegrityIssue>),
    #[error("invalid split: {0}")]
    Engine(EngineError),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("order not found")]
    NotFound,
    #[error("order changed meanwhile: {0}")]
    Conflict(String),
    #[error("rejected by the order service: {0}")]
    Validation(String),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("order id {0:?} cannot be used in a request path")]
    InvalidOrderId(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl CommitError {
    /// Whether the same commit may succeed if sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Server { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

impl From<EngineError> for CommitError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::IntegrityBlocked(issues) => Self::Integrity(issues),
            other => Self::Engine(other),
        }
    }
}

fn error_for_status(status: StatusCode, message: String) -> CommitError {
    match status.as_u16() {
        401 => CommitError::Unauthorized,
        403 => CommitError::Forbidden,
        404 => CommitError::NotFound,
        409 => CommitError::Conflict(message),
        422 => CommitError::Validation(message),
        _ => CommitError::Server { status, message },
    }
}

#[derive(Clone, Debug)]
pub struct SplitClient {
    client: Client,
    base_url: Url,
}

impl SplitClient {
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, CommitError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| CommitError::Setup(format!("invalid base_url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CommitError::Setup(format!("{base_url} cannot be a base url")));
        }

        let mut headers = header::HeaderMap::new();
        if !username.is_empty() {
            // "Basic base64(username:password)"
            let secret = format!("{username}:{password}");
            let secret = format!("Basic {}", base64::prelude::BASE64_STANDARD.encode(secret));
            let mut auth = header::HeaderValue::try_from(secret)
                .map_err(|err| CommitError::Setup(format!("invalid auth header value: {err}")))?;
            auth.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| CommitError::Setup(format!("failed to build http client: {err}")))?;

        Ok(Self { client, base_url })
    }

    pub fn builder() -> SplitClientBuilder {
        SplitClientBuilder::default()
    }

    fn url(&self, segments: &[&str]) -> Result<Url, CommitError> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(CommitError::InvalidOrderId(bad.to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CommitError::Setup(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Persist the session's current split.
    ///
    /// Refused locally, without a request, while the session reports
    /// integrity issues.
    pub async fn commit(&self, session: &SplitSession) -> Result<SplitResponse, CommitError> {
        let prepared = session.prepare_commit()?;
        self.send(&prepared).await
    }

    /// Post an already prepared commit and verify the answer.
    pub async fn send(&self, prepared: &PreparedCommit) -> Result<SplitResponse, CommitError> {
        let request = CommitRequest::from(&prepared.plan);
        let url = self.url(&request.segments(&prepared.order_id))?;
        tracing::debug!(
            "committing split of order {} ({} split order(s), key {})",
            prepared.order_id,
            prepared.plan.expected_split_orders(),
            prepared.idempotency_key
        );

        let mut req = self
            .client
            .post(url)
            .header(IDEMPOTENCY_KEY, prepared.idempotency_key.to_string());
        if let Some(version) = &prepared.version {
            req = req.header(header::IF_MATCH, version);
        }
        req = match &request {
            CommitRequest::Tickets(body) => req.json(body),
            CommitRequest::Even(body) => req.json(body),
        };

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!("split commit of order {} failed: {err}", prepared.order_id);
                return Err(err.into());
            }
        };
        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorResponse>().await {
                Ok(err) => err.error,
                Err(_) => "server error".to_string(),
            };
            tracing::warn!(
                "split commit of order {} rejected: {status}: {message}",
                prepared.order_id
            );
            return Err(error_for_status(status, message));
        }

        let response = resp.json::<SplitResponse>().await?;
        verify(prepared, &response)?;
        tracing::info!(
            "order {} split into {} order(s)",
            prepared.order_id,
            response.split_orders.len()
        );
        Ok(response)
    }
}

fn verify(prepared: &PreparedCommit, response: &SplitResponse) -> Result<(), CommitError> {
    if response.parent_order_id != prepared.order_id {
        return Err(CommitError::UnexpectedResponse(format!(
            "parent order {} does not match {}",
            response.parent_order_id, prepared.order_id
        )));
    }
    let expected = prepared.plan.expected_split_orders();
    if response.split_orders.len() != expected {
        return Err(CommitError::UnexpectedResponse(format!(
            "expected {expected} split order(s), got {}",
            response.split_orders.len()
        )));
    }
    Ok(())
}

#[derive(Default)]
pub struct SplitClientBuilder {
    base_url: String,
    username: String,
    password: String,
    timeout: Option<Duration>,
}

impl SplitClientBuilder {
    pub fn server(mut self, base_url: &str, username: &str, password: &str) -> SplitClientBuilder {
        self.base_url = base_url.to_string();
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> SplitClientBuilder {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SplitClient, CommitError> {
        if self.base_url.is_empty() {
            return Err(CommitError::Setup("missing server base url".to_string()));
        }
        SplitClient::new(
            &self.base_url,
            &self.username,
            &self.password,
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )
    }
}
