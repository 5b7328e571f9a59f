use std::fmt::Display;
use std::future::Future;

use fsamaps_client::{ClientError, FsaClient};
use fsamaps_core::{Business, ViewportQuery};

/// Anything that can answer a businesses-in-viewport query.
///
/// [`FsaClient`] is the production implementation; tests substitute in-memory
/// sources with controllable timing.
pub trait BusinessSource: Send + Sync {
    type Error: Display + Send;

    fn businesses_in_viewport(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Vec<Business>, Self::Error>> + Send;
}

impl BusinessSource for FsaClient {
    type Error = ClientError;

    fn businesses_in_viewport(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Vec<Business>, Self::Error>> + Send {
        FsaClient::businesses_in_viewport(self, query)
    }
}

impl<S: BusinessSource> BusinessSource for std::sync::Arc<S> {
    type Error = S::Error;

    fn businesses_in_viewport(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Vec<Business>, Self::Error>> + Send {
        (**self).businesses_in_viewport(query)
    }
}
