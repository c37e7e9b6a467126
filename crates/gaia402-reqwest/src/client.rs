//! Client-side x402 payment handling for reqwest.
//!
//! This module provides the [`PaymentsClient`] which orchestrates scheme
//! clients and payment selection for automatic challenge handling.

use http::{Extensions, HeaderMap, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use std::sync::Arc;

use gaia402_types::proto::{PaymentRequired, SettleResponse};
use gaia402_types::scheme::{FirstMatch, PaymentCandidate, PaymentError, PaymentScheme, PaymentSelector};

#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};

/// Request header carrying the base64-encoded payment envelope.
pub const PAYMENT_HEADER: &str = "X-Payment";

/// Response header carrying the base64-encoded settlement receipt.
pub const SETTLEMENT_HEADER: &str = "X-Payment-Response";

/// The payment-capable client that orchestrates scheme clients and selection.
///
/// [`PaymentsClient`] acts as middleware for reqwest, automatically handling
/// `402 Payment Required` responses by extracting payment requirements,
/// signing a payment through a registered scheme client, and retrying the
/// request with the payment header attached.
///
/// ## Creating a PaymentsClient
///
/// ```rust,no_run
/// use gaia402_reqwest::PaymentsClient;
///
/// let client = PaymentsClient::new();
/// ```
///
/// ## Registering scheme clients
///
/// To handle payments, register scheme clients (implementations of
/// `gaia402_types::scheme::PaymentScheme`, provided by scheme crates):
///
/// ```rust,ignore
/// let client = PaymentsClient::new().register(my_scheme_client);
/// ```
///
/// ## Retry budget
///
/// At most one authorized retry is made per request. Use
/// [`PaymentsClient::with_max_retries`] to change the budget; a challenge
/// received after the budget is exhausted is returned to the caller as-is.
pub struct PaymentsClient<TSelector> {
    schemes: RegisteredSchemes,
    selector: TSelector,
    max_retries: usize,
}

impl PaymentsClient<FirstMatch> {
    /// Creates a new [`PaymentsClient`] with default settings: `FirstMatch`
    /// selection and a single authorized retry per request.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for PaymentsClient<FirstMatch> {
    fn default() -> Self {
        Self {
            schemes: RegisteredSchemes::default(),
            selector: FirstMatch,
            max_retries: 1,
        }
    }
}

impl<TSelector> PaymentsClient<TSelector> {
    /// Registers a scheme client.
    ///
    /// Scheme clients handle the actual payment signing. Multiple clients can
    /// be registered; all of them are offered every challenge, and the
    /// selector picks among the candidates they produce.
    pub fn register<S>(mut self, scheme: S) -> Self
    where
        S: PaymentScheme + 'static,
    {
        self.schemes.push(scheme);
        self
    }

    /// Sets a custom payment selector.
    ///
    /// By default `FirstMatch` is used, which selects the first candidate in
    /// scheme registration order.
    pub fn with_selector<P: PaymentSelector + 'static>(self, selector: P) -> PaymentsClient<P> {
        PaymentsClient {
            selector,
            schemes: self.schemes,
            max_retries: self.max_retries,
        }
    }

    /// Sets the maximum number of authorized retries per request.
    ///
    /// The default is 1: one payment attempt per challenge, never a loop.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl<TSelector> PaymentsClient<TSelector>
where
    TSelector: PaymentSelector,
{
    /// Creates payment headers from a 402 response.
    ///
    /// Parses the payment requirements out of the challenge, selects the best
    /// candidate among those the registered schemes accept, signs it, and
    /// returns the header to include in the retry request.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::ParseError`] if the challenge cannot be
    /// parsed, [`PaymentError::NoMatchingPaymentOption`] if no registered
    /// scheme can handle it, and [`PaymentError::SigningError`] if the
    /// selected candidate fails to sign.
    #[cfg_attr(feature = "telemetry", instrument(name = "gaia402.reqwest.make_payment_headers", skip_all, err))]
    pub async fn make_payment_headers(&self, res: Response) -> Result<HeaderMap, PaymentError> {
        let payment_required = parse_payment_required(res)
            .await
            .ok_or_else(|| PaymentError::ParseError("Invalid 402 response".to_string()))?;
        let candidates = self.schemes.candidates(&payment_required);

        let selected = self
            .selector
            .select(&candidates)
            .ok_or(PaymentError::NoMatchingPaymentOption)?;

        #[cfg(feature = "telemetry")]
        debug!(
            scheme = %selected.scheme,
            network = %selected.network,
            amount = %selected.amount,
            "Selected payment candidate"
        );

        let signed_payload = selected.sign().await?;
        let value = signed_payload
            .parse()
            .map_err(|_| PaymentError::SigningError("payment header is not a valid header value".to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(PAYMENT_HEADER, value);

        Ok(headers)
    }
}

/// Internal collection of registered scheme clients.
#[derive(Default)]
pub struct RegisteredSchemes(Vec<Arc<dyn PaymentScheme>>);

impl RegisteredSchemes {
    /// Adds a scheme client to the collection.
    pub fn push<T: PaymentScheme + 'static>(&mut self, scheme: T) {
        self.0.push(Arc::new(scheme));
    }

    /// Collects candidates from every registered scheme for the given
    /// challenge, in registration order.
    pub fn candidates(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        let mut candidates = vec![];
        for scheme in self.0.iter() {
            candidates.extend(scheme.accept(payment_required));
        }
        candidates
    }
}

#[async_trait::async_trait]
impl<TSelector> rqm::Middleware for PaymentsClient<TSelector>
where
    TSelector: PaymentSelector + Send + Sync + 'static,
{
    /// Handles a request, transparently paying for 402 responses.
    ///
    /// When a 402 response is received, this middleware:
    /// 1. Extracts payment requirements from the challenge body
    /// 2. Signs a payment using registered scheme clients
    /// 3. Retries the request with the payment header attached
    ///
    /// The retry carries the original method, URL, and body. A challenge
    /// received after the retry budget is exhausted is returned unchanged.
    #[cfg_attr(feature = "telemetry", instrument(name = "gaia402.reqwest.handle", skip_all, err))]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let mut retry_req = req.try_clone();
        let mut res = next.clone().run(req, extensions).await?;
        let mut attempts = 0;

        while res.status() == StatusCode::PAYMENT_REQUIRED && attempts < self.max_retries {
            #[cfg(feature = "telemetry")]
            info!(url = ?res.url(), "Received 402 Payment Required, processing payment");

            let headers = self
                .make_payment_headers(res)
                .await
                .map_err(|e| rqm::Error::Middleware(e.into()))?;

            let mut retry = retry_req.take().ok_or(rqm::Error::Middleware(
                PaymentError::RequestNotCloneable.into(),
            ))?;
            // Keep an unauthorized clone around: a further challenge gets a
            // fresh signature, not a reused one.
            retry_req = retry.try_clone();
            retry.headers_mut().extend(headers);

            #[cfg(feature = "telemetry")]
            trace!(url = ?retry.url(), "Retrying request with payment headers");

            attempts += 1;
            res = next.clone().run(retry, extensions).await?;
        }

        #[cfg(feature = "telemetry")]
        if attempts > 0 {
            match settlement_from_response(&res) {
                Some(SettleResponse::Success {
                    payer,
                    transaction,
                    network,
                }) => info!(%payer, %transaction, %network, "Payment settled"),
                Some(SettleResponse::Error { reason, network }) => {
                    debug!(%reason, %network, "Settlement reported an error")
                }
                None => {}
            }
        }

        Ok(res)
    }
}

/// Parses a 402 response body into a [`PaymentRequired`] challenge.
#[cfg_attr(feature = "telemetry", instrument(name = "gaia402.reqwest.parse_payment_required", skip(response)))]
pub async fn parse_payment_required(response: Response) -> Option<PaymentRequired> {
    let bytes = response.bytes().await.ok()?;
    serde_json::from_slice::<PaymentRequired>(&bytes).ok()
}

/// Decodes the settlement receipt from a response's `X-Payment-Response`
/// header, if the server attached one.
pub fn settlement_from_response(response: &Response) -> Option<SettleResponse> {
    let value = response.headers().get(SETTLEMENT_HEADER)?;
    SettleResponse::from_header_bytes(value.as_bytes())
}
