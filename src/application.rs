use crate::api::{Api, UpstreamCustom};
use crate::errors::ComposeError;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::future::Future;

pub type ApiFuture<'a> = BoxFuture<'a, Result<Api<UpstreamCustom>, ComposeError>>;

/// The upstreams of one application, introspected independently and merged
/// downstream.
pub struct Application<'a> {
    pub name: String,
    apis: Vec<ApiFuture<'a>>,
}

impl<'a> Application<'a> {
    pub fn new(name: impl Into<String>) -> Application<'a> {
        Application {
            name: name.into(),
            apis: Vec::new(),
        }
    }

    /// Adds an upstream. Its introspection only starts in [`resolve`](Application::resolve).
    pub fn api<F, C>(mut self, api: F) -> Application<'a>
    where
        F: Future<Output = Result<Api<C>, ComposeError>> + Send + 'a,
        C: Into<UpstreamCustom>,
    {
        self.apis.push(api.map(|result| result.map(Api::into_upstream)).boxed());
        self
    }

    pub fn len(&self) -> usize {
        self.apis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }

    /// Introspects every upstream concurrently. Results are in insertion order,
    /// and a failing upstream does not abort the others.
    pub async fn resolve(self) -> Vec<Result<Api<UpstreamCustom>, ComposeError>> {
        let name = self.name;
        let results = join_all(self.apis).await;
        let failed = results.iter().filter(|result| result.is_err()).count();
        info!(application = %name, apis = results.len(), failed, "resolved application");
        results
    }
}
