#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Reqwest middleware for automatic x402 payment handling.
//!
//! This crate provides a [`PaymentsClient`] that can be used as a `reqwest`
//! middleware to automatically handle `402 Payment Required` responses. When
//! a request receives a 402, the middleware extracts the payment
//! requirements, signs a payment through a registered scheme client, and
//! retries the request with the payment header attached. By default at most
//! one authorized retry is made per request.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use gaia402_reqwest::{PaymentsClient, WithPayments, WithPaymentsBuild};
//! use reqwest::Client;
//!
//! // Create a payments client and register scheme clients
//! let payments = PaymentsClient::new()
//!     .register(my_scheme_client);
//!
//! // Build a reqwest client with the payment middleware
//! let http_client = Client::new()
//!     .with_payments(payments)
//!     .build();
//!
//! // Use the client - payments are handled automatically
//! let response = http_client
//!     .post("http://localhost:3000/v1/chat/completions")
//!     .json(&body)
//!     .send()
//!     .await?;
//! ```
//!
//! ## Registering scheme clients
//!
//! [`PaymentsClient`] uses a plugin architecture: anything implementing
//! `gaia402_types::scheme::PaymentScheme` can be registered, and the
//! middleware collects candidates from every registered scheme. The scheme
//! crates own all protocol and signing logic.
//!
//! ## Payment selection
//!
//! When multiple payment options are available, the configured
//! `PaymentSelector` chooses one. The default is `FirstMatch`; use
//! [`PaymentsClient::with_selector`] to install a different strategy such as
//! `MaxAmount`.

mod builder;
mod client;

pub use builder::*;
pub use client::*;
