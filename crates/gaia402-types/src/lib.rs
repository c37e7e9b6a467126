#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core client-side types for x402 payment-gated Gaia node APIs.
//!
//! This crate provides the foundational types for consuming HTTP APIs that are
//! protected by the x402 payment protocol: when a client requests a paid
//! resource, the server answers `402 Payment Required` with payment
//! requirements in the body. The client constructs a signed payment
//! authorization, attaches it as a header, and retries the request once.
//!
//! The crate is deliberately scheme-agnostic: it defines the wire format of
//! challenges and payment envelopes, and the [`scheme`] capability boundary
//! behind which concrete payment schemes (and their cryptographic signing)
//! live. Scheme implementations are provided by separate crates and plugged
//! in by the application.
//!
//! # Modules
//!
//! - [`credential`] - The opaque private signing credential
//! - [`proto`] - Wire format types for protocol messages (402 challenge, payment envelope, settlement receipt)
//! - [`scheme`] - Payment scheme system: candidate extraction, signing seam, selection strategies
//! - [`util`] - Helper types (base64)

pub mod credential;
pub mod proto;
pub mod scheme;
pub mod util;
