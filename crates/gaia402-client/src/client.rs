//! The typed Gaia node client.
//!
//! [`GaiaClient`] wraps a payment-capable HTTP client and exposes the two
//! gated endpoints as typed operations. It owns URL construction, optional
//! custom headers and timeout, and the error taxonomy; everything about
//! paying for a request lives in the injected middleware stack.

use http::{HeaderMap, StatusCode};
use reqwest_middleware as rqm;
use std::time::Duration;
use url::Url;

use gaia402_types::scheme::PaymentError;

use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, EmbeddingsRequest, EmbeddingsResponse,
};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// A client for a payment-gated Gaia node.
///
/// Endpoint URLs are computed once at construction relative to the base URL.
/// The client is cheap to clone and safe to reuse across sequential calls.
#[derive(Clone)]
pub struct GaiaClient {
    /// Base URL of the node (e.g. `http://localhost:3000/`)
    base_url: Url,
    /// Full URL for `POST /v1/chat/completions`
    chat_completions_url: Url,
    /// Full URL for `POST /v1/embeddings`
    embeddings_url: Url,
    /// The payment-capable HTTP client
    http: rqm::ClientWithMiddleware,
    /// Optional custom headers sent with each request
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
}

/// Errors that can occur while calling a Gaia node.
#[derive(Debug, thiserror::Error)]
pub enum GaiaClientError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: rqm::Error,
    },
    #[error("Payment failed: {context}: {source}")]
    Payment {
        context: &'static str,
        #[source]
        source: PaymentError,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl GaiaClient {
    /// Constructs a new [`GaiaClient`] from a base URL and a payment-capable
    /// HTTP client.
    ///
    /// This sets up the `./v1/chat/completions` and `./v1/embeddings`
    /// endpoint URLs relative to the base.
    pub fn try_new(
        base_url: Url,
        http: rqm::ClientWithMiddleware,
    ) -> Result<Self, GaiaClientError> {
        let chat_completions_url =
            base_url
                .join("./v1/chat/completions")
                .map_err(|e| GaiaClientError::UrlParse {
                    context: "Failed to construct ./v1/chat/completions URL",
                    source: e,
                })?;
        let embeddings_url =
            base_url
                .join("./v1/embeddings")
                .map_err(|e| GaiaClientError::UrlParse {
                    context: "Failed to construct ./v1/embeddings URL",
                    source: e,
                })?;
        Ok(Self {
            base_url,
            chat_completions_url,
            embeddings_url,
            http,
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// Constructs a [`GaiaClient`] from a string base URL, normalizing
    /// trailing slashes.
    pub fn from_base_url(
        base_url: &str,
        http: rqm::ClientWithMiddleware,
    ) -> Result<Self, GaiaClientError> {
        let mut normalized = base_url.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| GaiaClientError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        Self::try_new(url, http)
    }

    /// Returns the base URL used by this client.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the computed chat completions URL.
    pub fn chat_completions_url(&self) -> &Url {
        &self.chat_completions_url
    }

    /// Returns the computed embeddings URL.
    pub fn embeddings_url(&self) -> &Url {
        &self.embeddings_url
    }

    /// Attaches custom headers to all future requests.
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        let mut this = self.clone();
        this.headers = headers;
        this
    }

    /// Sets a timeout for all future requests. By default the transport's
    /// own timeout applies.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Sends a `POST /v1/chat/completions` request.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "gaia402.client.chat_completions", skip_all, err)
    )]
    pub async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GaiaClientError> {
        self.post_json(
            &self.chat_completions_url,
            "POST /v1/chat/completions",
            request,
        )
        .await
    }

    /// Sends a `POST /v1/embeddings` request.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "gaia402.client.embeddings", skip_all, err)
    )]
    pub async fn embeddings(
        &self,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, GaiaClientError> {
        self.post_json(&self.embeddings_url, "POST /v1/embeddings", request)
            .await
    }

    /// Generic POST helper that handles JSON serialization, error mapping,
    /// and timeout application.
    ///
    /// `context` is a human-readable identifier used in error messages
    /// (e.g. `"POST /v1/embeddings"`).
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, GaiaClientError>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.http.post(url.clone()).json(payload);
        for (key, value) in self.headers.iter() {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| classify_send_error(context, e))?;

        if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| GaiaClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| GaiaClientError::ResponseBodyRead { context, source: e })?;
            Err(GaiaClientError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

/// Splits transport failures from payment failures.
///
/// The payment middleware reports its failures as middleware errors; those
/// are surfaced as [`GaiaClientError::Payment`] so callers can tell an
/// unsatisfiable challenge apart from a network problem.
fn classify_send_error(context: &'static str, error: rqm::Error) -> GaiaClientError {
    match error {
        rqm::Error::Middleware(inner) => match inner.downcast::<PaymentError>() {
            Ok(payment) => GaiaClientError::Payment {
                context,
                source: payment,
            },
            Err(other) => GaiaClientError::Http {
                context,
                source: rqm::Error::Middleware(other),
            },
        },
        other => GaiaClientError::Http {
            context,
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use gaia402_reqwest::{PaymentsClient, WithPayments, WithPaymentsBuild};
    use gaia402_types::proto::{PaymentPayload, PaymentRequired, X402Version1};
    use gaia402_types::scheme::{CandidateSigner, PaymentCandidate, PaymentScheme};
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Match, Mock, MockServer, ResponseTemplate};

    struct NoPaymentHeader;

    impl Match for NoPaymentHeader {
        fn matches(&self, request: &wiremock::Request) -> bool {
            !request
                .headers
                .iter()
                .any(|(name, _)| name.as_str().eq_ignore_ascii_case("x-payment"))
        }
    }

    struct StubSigner {
        fail: bool,
    }

    #[async_trait]
    impl CandidateSigner for StubSigner {
        async fn sign(&self) -> Result<String, PaymentError> {
            if self.fail {
                return Err(PaymentError::SigningError(
                    "simulated signature failure".to_string(),
                ));
            }
            let payload = PaymentPayload {
                x402_version: X402Version1,
                scheme: "exact".to_string(),
                network: "base-sepolia".to_string(),
                payload: serde_json::value::RawValue::from_string(
                    r#"{"signature":"0xstub"}"#.to_string(),
                )
                .unwrap(),
            };
            Ok(payload.to_header_value().unwrap())
        }
    }

    struct StubScheme {
        fail: bool,
    }

    impl PaymentScheme for StubScheme {
        fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
            payment_required
                .accepts
                .iter()
                .map(|r| PaymentCandidate {
                    network: r.network.clone(),
                    scheme: r.scheme.clone(),
                    asset: r.asset.clone(),
                    amount: r.max_amount_required.parse().unwrap_or(0),
                    pay_to: r.pay_to.clone(),
                    signer: Box::new(StubSigner { fail: self.fail }),
                })
                .collect()
        }
    }

    fn challenge_body() -> serde_json::Value {
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

    fn plain_client() -> rqm::ClientWithMiddleware {
        rqm::ClientBuilder::new(Client::new()).build()
    }

    fn paying_client(fail: bool) -> rqm::ClientWithMiddleware {
        let payments = PaymentsClient::new().register(StubScheme { fail });
        Client::new().with_payments(payments).build()
    }

    #[tokio::test]
    async fn chat_completion_parses_success_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}]
            })))
            .mount(&server)
            .await;

        let gaia = GaiaClient::from_base_url(&server.uri(), plain_client()).unwrap();
        let response = gaia
            .chat_completions(&ChatCompletionRequest {
                model: "llama".to_string(),
                messages: vec![ChatMessage::user("hi")],
                temperature: None,
            })
            .await
            .unwrap();
        assert_eq!(response.first_content(), Some("hello"));
    }

    #[tokio::test]
    async fn embeddings_without_challenge_return_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        let gaia = GaiaClient::from_base_url(&server.uri(), paying_client(false)).unwrap();
        let response = gaia
            .embeddings(&EmbeddingsRequest {
                model: "text-embedding-ada-002".to_string(),
                input: "test".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.first_embedding().unwrap().len(), 3);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn chat_completion_pays_challenge_transparently() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header_exists("X-Payment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(NoPaymentHeader)
            .respond_with(ResponseTemplate::new(402).set_body_json(challenge_body()))
            .mount(&server)
            .await;

        let gaia = GaiaClient::from_base_url(&server.uri(), paying_client(false)).unwrap();
        let response = gaia
            .chat_completions(&ChatCompletionRequest {
                model: "llama".to_string(),
                messages: vec![ChatMessage::user("hi")],
                temperature: None,
            })
            .await
            .unwrap();

        // Same result as a plain success, two attempts on the wire.
        assert_eq!(response.first_content(), Some("hello"));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unsatisfiable_challenge_surfaces_payment_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(challenge_body()))
            .mount(&server)
            .await;

        let gaia = GaiaClient::from_base_url(&server.uri(), paying_client(true)).unwrap();
        let err = gaia
            .chat_completions(&ChatCompletionRequest {
                model: "llama".to_string(),
                messages: vec![ChatMessage::user("hi")],
                temperature: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GaiaClientError::Payment {
                source: PaymentError::SigningError(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn upstream_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let gaia = GaiaClient::from_base_url(&server.uri(), plain_client()).unwrap();
        let err = gaia
            .embeddings(&EmbeddingsRequest {
                model: "text-embedding-ada-002".to_string(),
                input: "test".into(),
            })
            .await
            .unwrap_err();
        match err {
            GaiaClientError::HttpStatus { status, body, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected HttpStatus, got: {other}"),
        }
    }

    #[tokio::test]
    async fn custom_headers_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());
        let gaia = GaiaClient::from_base_url(&server.uri(), plain_client())
            .unwrap()
            .with_headers(headers)
            .with_timeout(Duration::from_secs(5));
        let response = gaia
            .embeddings(&EmbeddingsRequest {
                model: "text-embedding-ada-002".to_string(),
                input: "test".into(),
            })
            .await
            .unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn base_url_normalization_strips_extra_slashes() {
        let gaia = GaiaClient::from_base_url("http://localhost:3000///", plain_client()).unwrap();
        assert_eq!(gaia.base_url().as_str(), "http://localhost:3000/");
        assert_eq!(
            gaia.chat_completions_url().as_str(),
            "http://localhost:3000/v1/chat/completions"
        );
        assert_eq!(
            gaia.embeddings_url().as_str(),
            "http://localhost:3000/v1/embeddings"
        );
    }
}
