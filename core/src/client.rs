//! The client seam: anything that can execute an `HttpRequest`.
//!
//! # Design
//! `HttpClient` has a single method so that swapping the network out is
//! trivial. `ReqwestClient` is the real transport; `FnClient` hands every
//! request to a closure, which is how tests fake a server without one.
//! Timeouts and cancellation are enforced by `dispatch`, not by the client,
//! so a client that ignores `HttpRequest::timeout` is still bounded.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CallError;
use crate::headers::Headers;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one request and returns its response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for &T {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Box<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        (**self).execute(request).await
    }
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Build a client with reqwest's defaults. Unlike `Default`, a failure to
    /// initialise the TLS backend is returned instead of panicking.
    pub fn try_new() -> Result<Self, CallError> {
        let inner = reqwest::Client::builder()
            .build()
            .map_err(CallError::transport)?;
        Ok(Self { inner })
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

impl From<reqwest::Client> for ReqwestClient {
    fn from(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        if request.is_relative() {
            return Err(CallError::transport(format!(
                "relative url {:?} has no host to connect to",
                request.url.path()
            )));
        }

        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|_| CallError::InvalidMethod(method.to_string()))?;
        let mut builder = self.inner.request(method, url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        let mut response_headers = Headers::new();
        for (name, value) in response.headers() {
            response_headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Option<Duration>) -> CallError {
    if err.is_timeout() {
        CallError::Timeout {
            timeout: timeout.unwrap_or_default(),
        }
    } else {
        CallError::transport(err)
    }
}

/// Test double that delegates every request to a closure.
///
/// ```
/// use httpcall::{FnClient, HttpResponse};
///
/// let client = FnClient::new(|_req| async { Ok(HttpResponse::new(200)) });
/// # let _ = client;
/// ```
pub struct FnClient<F> {
    handler: F,
}

impl<F, Fut> FnClient<F>
where
    F: Fn(HttpRequest) -> Fut,
    Fut: Future<Output = Result<HttpResponse, CallError>>,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> fmt::Debug for FnClient<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> HttpClient for FnClient<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, CallError>> + Send + 'static,
{
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        (self.handler)(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            url::Url::parse("http://localhost:3000/miep").unwrap(),
        )
    }

    #[tokio::test]
    async fn fn_client_delegates_to_the_closure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let client = FnClient::new(move |req: HttpRequest| {
            log.lock().unwrap().push(req.url.path().to_string());
            async { Ok(HttpResponse::new(200)) }
        });

        let resp = client.execute(request()).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(*seen.lock().unwrap(), vec!["/miep".to_string()]);
    }

    #[tokio::test]
    async fn fn_client_propagates_errors() {
        let client = FnClient::new(|_req| async { Err(CallError::transport("refused")) });
        let err = client.execute(request()).await.unwrap_err();
        assert!(matches!(err, CallError::Transport(_)));
    }

    #[tokio::test]
    async fn clients_work_behind_pointers() {
        let client = FnClient::new(|_req| async { Ok(HttpResponse::new(204)) });
        let shared: Arc<dyn HttpClient> = Arc::new(client);
        assert_eq!(shared.execute(request()).await.unwrap().status, 204);

        let boxed: Box<dyn HttpClient> = Box::new(FnClient::new(|_req| async {
            Ok(HttpResponse::new(202))
        }));
        assert_eq!(boxed.execute(request()).await.unwrap().status, 202);
    }

    #[tokio::test]
    async fn fn_client_serves_relative_references() {
        let client = FnClient::new(|req: HttpRequest| async move {
            assert!(req.is_relative());
            assert_eq!(req.url.path(), "/miep");
            Ok(HttpResponse::new(200))
        });
        let req = HttpRequest::new(HttpMethod::Get, crate::http::parse_url("/miep").unwrap());
        assert_eq!(client.execute(req).await.unwrap().status, 200);
    }

    #[tokio::test]
    async fn reqwest_client_rejects_relative_references() {
        let client = ReqwestClient::try_new().unwrap();
        let req = HttpRequest::new(HttpMethod::Get, crate::http::parse_url("/miep").unwrap());
        let err = client.execute(req).await.unwrap_err();
        assert!(matches!(err, CallError::Transport(_)), "{err:?}");
        assert!(err.to_string().contains("/miep"));
    }

    #[test]
    fn reqwest_client_builds() {
        let client = ReqwestClient::try_new().unwrap();
        let _ = client.inner();
        let _ = ReqwestClient::from(reqwest::Client::new());
    }
}
