//! Payment scheme system: the capability boundary between the generic
//! challenge/retry flow and the protocol logic that can actually pay.
//!
//! A [`PaymentScheme`] inspects a 402 challenge and offers zero or more
//! [`PaymentCandidate`]s it can satisfy. Each candidate carries a
//! [`CandidateSigner`] whose single operation produces the `X-Payment` header
//! value for the retry. Constructing and signing the authorization is the
//! scheme's business; this crate never sees a private key operation.
//!
//! When several candidates are available, a [`PaymentSelector`] picks one.
//! [`FirstMatch`] is the default; [`MaxAmount`] caps what a client is willing
//! to spend per request.

use async_trait::async_trait;

use crate::proto::PaymentRequired;

/// A concrete payable option extracted from a challenge by a scheme client.
pub struct PaymentCandidate {
    /// The network name the payment would settle on.
    pub network: String,
    /// The payment scheme name (e.g., "exact").
    pub scheme: String,
    /// The token asset address.
    pub asset: String,
    /// The amount required, in token base units.
    pub amount: u128,
    /// The recipient address.
    pub pay_to: String,
    /// Produces the signed payment header for this candidate.
    pub signer: Box<dyn CandidateSigner>,
}

impl PaymentCandidate {
    /// Signs this candidate, producing the `X-Payment` header value.
    pub async fn sign(&self) -> Result<String, PaymentError> {
        self.signer.sign().await
    }
}

/// The single signing operation behind a [`PaymentCandidate`].
///
/// Implementations live in scheme crates; they hold whatever credential and
/// chain context they need.
#[async_trait]
pub trait CandidateSigner: Send + Sync {
    /// Produces the `X-Payment` header value, or a typed failure.
    async fn sign(&self) -> Result<String, PaymentError>;
}

/// A payment scheme client: the substitutable external collaborator that
/// knows how to satisfy a challenge.
pub trait PaymentScheme: Send + Sync {
    /// Returns the candidates this scheme can satisfy for the given
    /// challenge. An empty vector means the scheme does not apply.
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate>;
}

/// Strategy for selecting a payment candidate from the available options.
pub trait PaymentSelector: Send + Sync {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate>;
}

/// Default selector: returns the first candidate.
/// Order is determined by registration order of scheme clients.
pub struct FirstMatch;

impl PaymentSelector for FirstMatch {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates.first()
    }
}

/// Selector that only accepts candidates up to a maximum amount of token
/// base units.
pub struct MaxAmount(pub u128);

impl PaymentSelector for MaxAmount {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates.iter().find(|c| c.amount <= self.0)
    }
}

/// Failures in the payment flow, distinguishable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("No matching payment option found")]
    NoMatchingPaymentOption,

    #[error("Request is not cloneable (streaming body?)")]
    RequestNotCloneable,

    #[error("Failed to parse 402 response: {0}")]
    ParseError(String),

    #[error("Failed to sign payment: {0}")]
    SigningError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
