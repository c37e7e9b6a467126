use reqwest::{Client, ClientBuilder};
use reqwest_middleware as rqm;

use crate::client::PaymentsClient;

/// Attaches a [`PaymentsClient`] to a reqwest client or builder.
pub trait WithPayments<A, S> {
    fn with_payments(self, payments: PaymentsClient<S>) -> PaymentsBuilder<A, S>;
}

impl<S> WithPayments<Client, S> for Client {
    fn with_payments(self, payments: PaymentsClient<S>) -> PaymentsBuilder<Client, S> {
        PaymentsBuilder {
            inner: self,
            payments,
        }
    }
}

impl<S> WithPayments<ClientBuilder, S> for ClientBuilder {
    fn with_payments(self, payments: PaymentsClient<S>) -> PaymentsBuilder<ClientBuilder, S> {
        PaymentsBuilder {
            inner: self,
            payments,
        }
    }
}

/// Intermediate builder pairing a reqwest client (or builder) with the
/// payment middleware.
pub struct PaymentsBuilder<A, S> {
    inner: A,
    payments: PaymentsClient<S>,
}

/// Finishes a [`PaymentsBuilder`] into a middleware-wrapped client.
pub trait WithPaymentsBuild {
    type BuildResult;
    type BuilderResult;

    fn build(self) -> Self::BuildResult;
    fn builder(self) -> Self::BuilderResult;
}

impl<S> WithPaymentsBuild for PaymentsBuilder<Client, S>
where
    PaymentsClient<S>: rqm::Middleware,
{
    type BuildResult = rqm::ClientWithMiddleware;
    type BuilderResult = rqm::ClientBuilder;

    fn build(self) -> Self::BuildResult {
        self.builder().build()
    }

    fn builder(self) -> Self::BuilderResult {
        rqm::ClientBuilder::new(self.inner).with(self.payments)
    }
}

impl<S> WithPaymentsBuild for PaymentsBuilder<ClientBuilder, S>
where
    PaymentsClient<S>: rqm::Middleware,
{
    type BuildResult = Result<rqm::ClientWithMiddleware, reqwest::Error>;
    type BuilderResult = Result<rqm::ClientBuilder, reqwest::Error>;

    fn build(self) -> Self::BuildResult {
        let builder = self.builder()?;
        Ok(builder.build())
    }

    fn builder(self) -> Self::BuilderResult {
        let client = self.inner.build()?;
        Ok(rqm::ClientBuilder::new(client).with(self.payments))
    }
}
