#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Typed client for x402 payment-gated Gaia node inference APIs.
//!
//! A Gaia node exposes an OpenAI-compatible HTTP API behind an x402 paywall:
//! `POST /v1/chat/completions` and `POST /v1/embeddings`. This crate provides
//! [`GaiaClient`], a thin typed layer over a payment-capable HTTP client.
//!
//! The payment handling itself is injected: [`GaiaClient`] is constructed
//! from a `reqwest_middleware::ClientWithMiddleware`, typically built with
//! `gaia402-reqwest`'s payment middleware. The client performs no retries of
//! its own; the single authorized payment retry lives in the middleware.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use gaia402_client::{ChatCompletionRequest, ChatMessage, GaiaClient};
//! use gaia402_reqwest::{PaymentsClient, WithPayments, WithPaymentsBuild};
//! use reqwest::Client;
//!
//! let payments = PaymentsClient::new().register(my_scheme_client);
//! let http = Client::new().with_payments(payments).build();
//! let gaia = GaiaClient::from_base_url("http://localhost:3000", http)?;
//!
//! let response = gaia
//!     .chat_completions(&ChatCompletionRequest {
//!         model: "llama".to_string(),
//!         messages: vec![ChatMessage::user("What is the meaning of life?")],
//!         temperature: Some(0.7),
//!     })
//!     .await?;
//! println!("AI Response: {}", response.first_content().unwrap_or_default());
//! ```

mod client;
mod types;

pub use client::*;
pub use types::*;
