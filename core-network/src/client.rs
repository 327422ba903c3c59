//! Request Client
//!
//! Builds requests for the two sample REST services, runs each one on a
//! background task, and reports the outcome through a [`PendingCall`] and,
//! optionally, the event bus.
//!
//! ## Example
//!
//! ```ignore
//! use core_network::RequestClient;
//! use core_runtime::HostContext;
//!
//! let client = RequestClient::new(http_client, config.network.clone())?
//!     .with_event_bus(bus.clone());
//! client.initialize(Some(HostContext::new("simple-framework", "0.1.0")));
//!
//! let sentence = client.yoda_speak("My name is Todor.")?.outcome().await?;
//! client.random_quote("movies")?.detach();
//! ```

use crate::dispatch::Dispatcher;
use crate::error::{NetworkError, Result};
use crate::events::{QuoteReceived, RequestAborted, RequestCompleted};
use crate::model::Quote;
use crate::operation::Operation;
use crate::outcome::{Outcome, PendingCall};
use bridge_traits::{HttpClient, HttpRequest};
use core_runtime::{EventBus, HostContext, NetworkConfig};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

/// Header carrying the static API credential
pub const API_KEY_HEADER: &str = "X-Mashape-Key";

/// Body of a random-quote request
#[derive(Serialize)]
struct CategoryBody<'a> {
    cat: &'a str,
}

/// Response of [`RequestClient::invoke`], by operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw text of a transformed sentence
    Text(String),
    Quote(Quote),
}

/// Client for the sample REST services.
///
/// Every call is independent: there is no retry, no cancellation, and no
/// ordering between calls.
pub struct RequestClient {
    http: Arc<dyn HttpClient>,
    config: NetworkConfig,
    events: Option<EventBus>,
    context: OnceLock<HostContext>,
    dispatcher: Dispatcher,
}

impl RequestClient {
    /// Create a client.
    ///
    /// Called from inside a Tokio runtime, requests run on that runtime;
    /// otherwise the client starts its own single worker thread.
    pub fn new(http: Arc<dyn HttpClient>, config: NetworkConfig) -> Result<Self> {
        Ok(Self {
            http,
            config,
            events: None,
            context: OnceLock::new(),
            dispatcher: Dispatcher::new()?,
        })
    }

    /// Publish request events on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Attach the host context.
    ///
    /// Only the first context is kept. `None` is logged and ignored.
    pub fn initialize(&self, context: Option<HostContext>) {
        let Some(context) = context else {
            error!("Host context is missing, request client not initialized");
            return;
        };

        if self.context.set(context).is_err() {
            debug!("Request client already initialized");
            return;
        }

        info!("Request client initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.context.get().is_some()
    }

    /// Whether requests run one at a time on a dedicated thread
    pub fn is_serial(&self) -> bool {
        self.dispatcher.is_serial()
    }

    /// Start `operation` with `parameter`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidParameter`] if `parameter` is missing or
    /// empty; no request is made in that case.
    pub fn invoke(
        &self,
        operation: Operation,
        parameter: Option<&str>,
    ) -> Result<PendingCall<Payload>> {
        let exchange = self.prepare(operation, parameter)?;

        let handle = match operation {
            Operation::YodaSpeak => self.dispatcher.spawn(async move {
                exchange
                    .fetch_text()
                    .await
                    .map(|outcome| outcome.map(Payload::Text))
            })?,
            Operation::RandomQuotes => self.dispatcher.spawn(async move {
                exchange
                    .fetch_quote()
                    .await
                    .map(|outcome| outcome.map(Payload::Quote))
            })?,
        };

        Ok(PendingCall::new(operation, handle))
    }

    /// GET the transformed form of `sentence`
    pub fn yoda_speak(&self, sentence: &str) -> Result<PendingCall<String>> {
        let exchange = self.prepare(Operation::YodaSpeak, Some(sentence))?;
        let handle = self
            .dispatcher
            .spawn(async move { exchange.fetch_text().await })?;

        Ok(PendingCall::new(Operation::YodaSpeak, handle))
    }

    /// POST `category` and receive a random quote
    pub fn random_quote(&self, category: &str) -> Result<PendingCall<Quote>> {
        let exchange = self.prepare(Operation::RandomQuotes, Some(category))?;
        let handle = self
            .dispatcher
            .spawn(async move { exchange.fetch_quote().await })?;

        Ok(PendingCall::new(Operation::RandomQuotes, handle))
    }

    fn prepare(&self, operation: Operation, parameter: Option<&str>) -> Result<Exchange> {
        info!(operation = %operation, "Attempting to execute request");

        let parameter = match parameter {
            Some(parameter) if !parameter.is_empty() => parameter,
            _ => {
                info!(operation = %operation, "NULL or empty parameter");
                info!(operation = %operation, "{} aborted", operation);
                return Err(NetworkError::InvalidParameter { operation });
            }
        };

        Ok(Exchange {
            http: Arc::clone(&self.http),
            events: self.events.clone(),
            operation,
            request: self.build_request(operation, parameter)?,
        })
    }

    fn build_request(&self, operation: Operation, parameter: &str) -> Result<HttpRequest> {
        let request = match operation {
            Operation::YodaSpeak => {
                HttpRequest::get(&self.config.yoda_speak_url).query("sentence", parameter)
            }
            Operation::RandomQuotes => HttpRequest::post(&self.config.random_quotes_url)
                .json(&CategoryBody { cat: parameter })
                .map_err(|e| NetworkError::Encode {
                    operation,
                    message: e.to_string(),
                })?,
        };

        let mut request = request
            .accept(operation.accept())
            .header(API_KEY_HEADER, self.config.api_key.as_str());

        if let Some(context) = self.context.get() {
            request = request.header("User-Agent", context.user_agent());
        }

        Ok(request)
    }
}

/// Everything a background task needs to run one request
struct Exchange {
    http: Arc<dyn HttpClient>,
    events: Option<EventBus>,
    operation: Operation,
    request: HttpRequest,
}

impl Exchange {
    async fn fetch_text(self) -> Result<Outcome<String>> {
        let operation = self.operation;
        info!(operation = %operation, "{} request to be executed", operation);

        let response = match self.http.execute(self.request).await {
            Ok(response) => response,
            Err(source) => {
                error!(operation = %operation, error = %source, "{} request failed", operation);
                if let Some(bus) = &self.events {
                    bus.publish(RequestAborted {
                        operation,
                        reason: source.to_string(),
                    });
                }
                return Err(NetworkError::Transport { operation, source });
            }
        };

        let outcome = if response.is_success() {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            info!(operation = %operation, "{} request executed successfully", operation);
            info!(operation = %operation, result = %body, "{} request result", operation);
            Outcome::Success(body)
        } else {
            let message = response.message();
            info!(operation = %operation, "{} request failed", operation);
            info!(operation = %operation, status = response.status, "{} request error code", operation);
            info!(operation = %operation, message = %message, "{} request error message", operation);
            Outcome::Failure {
                status: response.status,
                message,
            }
        };

        if let Some(bus) = &self.events {
            bus.publish(RequestCompleted {
                operation,
                outcome: outcome.clone(),
            });
        }

        Ok(outcome)
    }

    async fn fetch_quote(self) -> Result<Outcome<Quote>> {
        let operation = self.operation;
        let events = self.events.clone();

        let body = match self.fetch_text().await? {
            Outcome::Success(body) => body,
            Outcome::Failure { status, message } => {
                return Ok(Outcome::Failure { status, message })
            }
        };

        let quote = Quote::from_json(&body).map_err(|e| {
            warn!(operation = %operation, error = %e, "Quote response could not be decoded");
            NetworkError::Decode {
                operation,
                message: e.to_string(),
            }
        })?;

        debug!(operation = %operation, author = %quote.author, "Quote decoded");
        if let Some(bus) = &events {
            bus.publish(QuoteReceived(quote.clone()));
        }

        Ok(Outcome::Success(quote))
    }
}
