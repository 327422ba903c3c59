//! Events published on the [`EventBus`](core_runtime::EventBus) when one is
//! attached to the [`RequestClient`](crate::RequestClient).
//!
//! Handlers run on the background thread that completed the request.

use crate::model::Quote;
use crate::operation::Operation;
use crate::outcome::Outcome;

/// An HTTP exchange finished, successfully or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCompleted {
    pub operation: Operation,
    /// Raw response body on success
    pub outcome: Outcome<String>,
}

/// A request failed before a response was received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAborted {
    pub operation: Operation,
    pub reason: String,
}

/// A random-quote response was decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteReceived(pub Quote);
