//! # Network Module
//!
//! Request client for the sample REST services.
//!
//! ## Overview
//!
//! [`RequestClient`] wraps an injected
//! [`HttpClient`](bridge_traits::HttpClient) and performs two calls:
//!
//! - [`yoda_speak`](RequestClient::yoda_speak): GET a sentence rewritten by
//!   the transformed-text service
//! - [`random_quote`](RequestClient::random_quote): POST a category and
//!   decode the returned [`Quote`]
//!
//! Each call validates its parameter, then runs on a background task and
//! hands back a [`PendingCall`]. A non-2xx response is an
//! [`Outcome::Failure`]; transport and decode problems are
//! [`NetworkError`]s. Nothing is retried.
//!
//! ## Events
//!
//! With an [`EventBus`](core_runtime::EventBus) attached, the client
//! publishes [`RequestCompleted`], [`RequestAborted`] and [`QuoteReceived`].

mod dispatch;

pub mod client;
pub mod error;
pub mod events;
pub mod model;
pub mod operation;
pub mod outcome;

pub use client::{Payload, RequestClient, API_KEY_HEADER};
pub use error::{NetworkError, Result};
pub use events::{QuoteReceived, RequestAborted, RequestCompleted};
pub use model::Quote;
pub use operation::Operation;
pub use outcome::{Outcome, PendingCall};
