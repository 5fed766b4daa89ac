use std::sync::Arc;
use std::time::Duration;

use loanpro_core::envelope::{decode_entity, decode_payload, resolve_page};
use loanpro_core::{Customer, DecodeError, Loan, Page, Payment, SearchResults, Transaction};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::query::{customer_search_body, loan_search_body};
use crate::util::{authorization_value, client, truncate_for_log};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const TENANT_HEADER: &str = "Autopal-Instance-Id";

const API_PREFIX: &str = "/public/api/1";
const LOAN_DETAIL_EXPAND: &str = "LoanSettings,LoanSetup,Customers,StatusArchive";
const LOG_BODY_MAX_CHARS: usize = 4_000;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub tenant_id: String,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Receives every exchange with the remote API. Injected into the client so
/// request/response diagnostics stay out of the data layer.
pub trait ExchangeObserver: Send + Sync {
    fn on_request(&self, method: &Method, url: &Url, body: Option<&Value>);
    fn on_response(&self, method: &Method, url: &Url, status: StatusCode, body: &[u8]);
    fn on_failure(&self, method: &Method, url: &Url, error: &ClientError);
}

/// Emits exchanges as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExchangeObserver for TracingObserver {
    fn on_request(&self, method: &Method, url: &Url, body: Option<&Value>) {
        let body = body.map(|body| body.to_string()).unwrap_or_default();
        tracing::debug!(
            event = "loanpro_request",
            method = %method,
            url = %url,
            body = %body,
        );
    }

    fn on_response(&self, method: &Method, url: &Url, status: StatusCode, body: &[u8]) {
        tracing::debug!(
            event = "loanpro_response",
            method = %method,
            url = %url,
            status = status.as_u16(),
            body = %truncate_for_log(&String::from_utf8_lossy(body), LOG_BODY_MAX_CHARS),
        );
    }

    fn on_failure(&self, method: &Method, url: &Url, error: &ClientError) {
        tracing::error!(
            event = "loanpro_request_failed",
            method = %method,
            url = %url,
            error = %error,
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExchangeObserver for NoopObserver {
    fn on_request(&self, _method: &Method, _url: &Url, _body: Option<&Value>) {}
    fn on_response(&self, _method: &Method, _url: &Url, _status: StatusCode, _body: &[u8]) {}
    fn on_failure(&self, _method: &Method, _url: &Url, _error: &ClientError) {}
}

/// Read-only client for the LoanPro REST/OData API.
#[derive(Clone)]
pub struct LoanProClient {
    config: ClientConfig,
    base: Url,
    http: reqwest::Client,
    observer: Arc<dyn ExchangeObserver>,
}

impl std::fmt::Debug for LoanProClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanProClient")
            .field("base_url", &self.config.base_url)
            .field("tenant_id", &self.config.tenant_id)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl LoanProClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }
        let http = client(config.timeout).map_err(ClientError::Build)?;
        Ok(Self {
            config,
            base,
            http,
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExchangeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Loan with settings, setup, customers and status archive expanded.
    pub async fn get_loan(&self, loan_id: &str) -> Result<Loan, ClientError> {
        let path = format!("/odata.svc/Loans({loan_id})");
        let body = self
            .send(Method::GET, &path, &[("$expand", LOAN_DETAIL_EXPAND.to_string())], None)
            .await?;
        Ok(decode_entity("loan", &body)?)
    }

    pub async fn search_loans(
        &self,
        search_term: Option<&str>,
        status: Option<&str>,
        limit: u64,
    ) -> Result<SearchResults<Loan>, ClientError> {
        let query = loan_search_body(search_term, status, limit);
        let body = self
            .send(Method::POST, "/Loans/Autopal.Search()", &[], Some(query))
            .await?;
        Ok(decode_entity("loan search results", &body)?)
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer, ClientError> {
        let path = format!("/odata.svc/Customers({customer_id})");
        let body = self.send(Method::GET, &path, &[], None).await?;
        Ok(decode_entity("customer", &body)?)
    }

    pub async fn search_customers(
        &self,
        search_term: Option<&str>,
        limit: u64,
    ) -> Result<SearchResults<Customer>, ClientError> {
        let query = customer_search_body(search_term, limit);
        let body = self
            .send(Method::POST, "/Customers/Autopal.Search()", &[], Some(query))
            .await?;
        Ok(decode_entity("customer search results", &body)?)
    }

    /// Payments embedded in the loan entity; an absent collection is empty.
    pub async fn get_loan_payments(&self, loan_id: &str) -> Result<Vec<Payment>, ClientError> {
        let path = format!("/odata.svc/Loans({loan_id})");
        let body = self
            .send(Method::GET, &path, &[("$expand", "Payments".to_string())], None)
            .await?;
        let loan: Loan = decode_entity("loan payments", &body)?;
        Ok(loan.payment_history().to_vec())
    }

    /// `limit`/`offset` of zero are not sent.
    pub async fn get_loan_transactions(
        &self,
        loan_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Page<Transaction>, ClientError> {
        let path = format!("/odata.svc/Loans({loan_id})/Transactions");
        let mut query = Vec::new();
        if limit > 0 {
            query.push(("$top", limit.to_string()));
        }
        if offset > 0 {
            query.push(("$skip", offset.to_string()));
        }
        let body = self.send(Method::GET, &path, &query, None).await?;
        let payload = decode_payload(&body)?;
        let page = resolve_page(payload, limit, offset);
        if page.items.is_empty() {
            tracing::debug!(event = "loanpro_transactions_empty", loan_id = %loan_id);
        }
        Ok(page)
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!(
            "{}{API_PREFIX}{path}",
            self.base.as_str().trim_end_matches('/')
        ))
        .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(path, query)?;
        self.observer.on_request(&method, &url, body.as_ref());

        let result = self.execute(method.clone(), url.clone(), body).await;
        if let Err(err) = &result {
            self.observer.on_failure(&method, &url, err);
        }
        result
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Vec<u8>, ClientError> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(TENANT_HEADER, &self.config.tenant_id)
            .header(
                reqwest::header::AUTHORIZATION,
                authorization_value(&self.config.api_key),
            )
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let request_failed = |source| ClientError::Request {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(request_failed)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(request_failed)?;
        self.observer.on_response(&method, &url, status, &bytes);

        if status != StatusCode::OK {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}
