//! Wire format types for x402 payment messages.
//!
//! This module defines the protocol messages a paying client exchanges with a
//! payment-gated server:
//!
//! - [`PaymentRequired`] - the JSON body of a `402 Payment Required` response
//! - [`PaymentRequirements`] - one acceptable payment method from a challenge
//! - [`PaymentPayload`] - the signed payment envelope attached on retry
//! - [`SettleResponse`] - the settlement receipt returned by the server
//!
//! All types serialize to JSON using camelCase field names. The protocol
//! version is indicated by the `x402Version` field.
//!
//! # Headers
//!
//! The payment envelope travels base64-encoded in the `X-Payment` request
//! header; the settlement receipt travels base64-encoded in the
//! `X-Payment-Response` response header.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;

use crate::util::Base64Bytes;

/// Version marker for x402 protocol version 1.
///
/// Serializes as the integer `1` and rejects any other value on
/// deserialization, so a mismatched challenge fails to parse instead of being
/// silently misread.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u8 = 1;
}

impl From<X402Version1> for u8 {
    fn from(_: X402Version1) -> Self {
        X402Version1::VALUE
    }
}

impl Serialize for X402Version1 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = u8::deserialize(deserializer)?;
        if num == Self::VALUE {
            Ok(X402Version1)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

impl Display for X402Version1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// One acceptable payment method, as advertised by the server in a challenge.
///
/// Amounts are decimal strings of token base units; scheme-specific data
/// rides in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The maximum amount required for payment, in base units.
    pub max_amount_required: String,
    /// The resource URL being paid for.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource.
    pub mime_type: String,
    /// Optional JSON schema describing the resource output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// The recipient address for payment.
    pub pay_to: String,
    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,
    /// The token asset address.
    pub asset: String,
    /// Scheme-specific extra data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// The body of a `402 Payment Required` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// List of acceptable payment methods.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    /// Optional error message if the request was malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A signed payment authorization, attached to a retried request.
///
/// The scheme-specific signed payload is kept as raw JSON so this crate does
/// not need to understand every scheme's inner structure.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The scheme-specific signed payload.
    pub payload: Box<serde_json::value::RawValue>,
}

impl PaymentPayload {
    /// Encodes this envelope as an `X-Payment` header value: base64 over the
    /// JSON serialization.
    pub fn to_header_value(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(Base64Bytes::encode(json).to_string())
    }
}

/// Settlement receipt surfaced by the server after a paid request, carried
/// base64-encoded in the `X-Payment-Response` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleResponse {
    /// Settlement succeeded.
    Success {
        /// The address that paid.
        payer: String,
        /// The transaction hash.
        transaction: String,
        /// The network where settlement occurred.
        network: String,
    },
    /// Settlement failed.
    Error {
        /// The reason for failure.
        reason: String,
        /// The network where settlement was attempted.
        network: String,
    },
}

impl SettleResponse {
    /// Decodes a settlement receipt from an `X-Payment-Response` header value.
    pub fn from_header_bytes(value: &[u8]) -> Option<SettleResponse> {
        let decoded = Base64Bytes::from(value).decode().ok()?;
        serde_json::from_slice(&decoded).ok()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponseWire {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    pub network: String,
}

impl Serialize for SettleResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            SettleResponse::Success {
                payer,
                transaction,
                network,
            } => SettleResponseWire {
                success: true,
                error_reason: None,
                payer: Some(payer.clone()),
                transaction: Some(transaction.clone()),
                network: network.clone(),
            },
            SettleResponse::Error { reason, network } => SettleResponseWire {
                success: false,
                error_reason: Some(reason.clone()),
                payer: None,
                transaction: None,
                network: network.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SettleResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = SettleResponseWire::deserialize(deserializer)?;
        match wire.success {
            true => {
                let payer = wire
                    .payer
                    .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
                let transaction = wire
                    .transaction
                    .ok_or_else(|| serde::de::Error::missing_field("transaction"))?;
                Ok(SettleResponse::Success {
                    payer,
                    transaction,
                    network: wire.network,
                })
            }
            false => {
                let reason = wire
                    .error_reason
                    .ok_or_else(|| serde::de::Error::missing_field("errorReason"))?;
                Ok(SettleResponse::Error {
                    reason,
                    network: wire.network,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_challenge() -> serde_json::Value {
        json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base-sepolia",
                "maxAmountRequired": "100000",
                "resource": "http://localhost:3000/v1/chat/completions",
                "description": "Access to premium content",
                "mimeType": "application/json",
                "payTo": "0x0ED6Cec17F860fb54E21D154b49DAEFd9Ca04106",
                "maxTimeoutSeconds": 60,
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
            }]
        })
    }

    #[test]
    fn version_marker_serializes_as_literal_one() {
        assert_eq!(serde_json::to_value(X402Version1).unwrap(), json!(1));
    }

    #[test]
    fn version_marker_rejects_other_versions() {
        let result = serde_json::from_value::<X402Version1>(json!(2));
        assert!(result.is_err());
    }

    #[test]
    fn challenge_parses_with_one_accept() {
        let challenge: PaymentRequired = serde_json::from_value(sample_challenge()).unwrap();
        assert_eq!(challenge.accepts.len(), 1);
        assert_eq!(challenge.accepts[0].scheme, "exact");
        assert_eq!(challenge.accepts[0].max_amount_required, "100000");
        assert!(challenge.error.is_none());
    }

    #[test]
    fn challenge_accepts_defaults_to_empty() {
        let challenge: PaymentRequired =
            serde_json::from_value(json!({"x402Version": 1, "error": "payment required"}))
                .unwrap();
        assert!(challenge.accepts.is_empty());
        assert_eq!(challenge.error.as_deref(), Some("payment required"));
    }

    #[test]
    fn payment_payload_header_value_round_trips() {
        let payload = PaymentPayload {
            x402_version: X402Version1,
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            payload: serde_json::value::RawValue::from_string(r#"{"signature":"0xabc"}"#.to_string())
                .unwrap(),
        };
        let header = payload.to_header_value().unwrap();
        let decoded = Base64Bytes::from(header.as_bytes()).decode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["x402Version"], json!(1));
        assert_eq!(value["scheme"], json!("exact"));
        assert_eq!(value["payload"]["signature"], json!("0xabc"));
    }

    #[test]
    fn settle_response_success_round_trips() {
        let settle = SettleResponse::Success {
            payer: "0xpayer".to_string(),
            transaction: "0xtx".to_string(),
            network: "base-sepolia".to_string(),
        };
        let value = serde_json::to_value(&settle).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["payer"], json!("0xpayer"));
        let back: SettleResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, settle);
    }

    #[test]
    fn settle_response_error_round_trips() {
        let settle = SettleResponse::Error {
            reason: "insufficient_funds".to_string(),
            network: "base-sepolia".to_string(),
        };
        let value = serde_json::to_value(&settle).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["errorReason"], json!("insufficient_funds"));
        let back: SettleResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, settle);
    }

    #[test]
    fn settle_response_success_requires_payer() {
        let result = serde_json::from_value::<SettleResponse>(
            json!({"success": true, "transaction": "0xtx", "network": "base-sepolia"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn settle_response_decodes_from_header_bytes() {
        let settle = SettleResponse::Success {
            payer: "0xpayer".to_string(),
            transaction: "0xtx".to_string(),
            network: "base-sepolia".to_string(),
        };
        let encoded = Base64Bytes::encode(serde_json::to_vec(&settle).unwrap());
        let decoded = SettleResponse::from_header_bytes(encoded.as_ref()).unwrap();
        assert_eq!(decoded, settle);
    }

    #[test]
    fn settle_response_from_garbage_header_is_none() {
        assert!(SettleResponse::from_header_bytes(b"not base64!!").is_none());
    }
}
