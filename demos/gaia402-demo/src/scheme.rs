//! Placeholder payment scheme for local development.
//!
//! Accepts every "exact" requirement in a challenge and emits an unsigned
//! payment envelope. Permissive dev servers accept it; a paywalled
//! deployment will reject the retry and the failure surfaces as a payment
//! error. Production clients register a real scheme crate here instead.

use async_trait::async_trait;

use gaia402_types::credential::PrivateKey;
use gaia402_types::proto::{PaymentPayload, PaymentRequired, X402Version1};
use gaia402_types::scheme::{CandidateSigner, PaymentCandidate, PaymentError, PaymentScheme};

pub struct PlaceholderScheme {
    // TODO: hand this to an eip155 "exact" scheme client once one is wired in.
    #[allow(dead_code)]
    credential: PrivateKey,
}

impl PlaceholderScheme {
    pub fn new(credential: PrivateKey) -> Self {
        Self { credential }
    }
}

impl PaymentScheme for PlaceholderScheme {
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        payment_required
            .accepts
            .iter()
            .filter(|r| r.scheme == "exact")
            .map(|r| PaymentCandidate {
                network: r.network.clone(),
                scheme: r.scheme.clone(),
                asset: r.asset.clone(),
                amount: r.max_amount_required.parse().unwrap_or(u128::MAX),
                pay_to: r.pay_to.clone(),
                signer: Box::new(PlaceholderSigner {
                    scheme: r.scheme.clone(),
                    network: r.network.clone(),
                }),
            })
            .collect()
    }
}

struct PlaceholderSigner {
    scheme: String,
    network: String,
}

#[async_trait]
impl CandidateSigner for PlaceholderSigner {
    async fn sign(&self) -> Result<String, PaymentError> {
        let payload = PaymentPayload {
            x402_version: X402Version1,
            scheme: self.scheme.clone(),
            network: self.network.clone(),
            payload: serde_json::value::RawValue::from_string(
                r#"{"unsigned":true}"#.to_string(),
            )?,
        };
        payload
            .to_header_value()
            .map_err(|e| PaymentError::SigningError(e.to_string()))
    }
}
