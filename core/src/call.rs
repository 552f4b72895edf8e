//! The call family: build a request, bound it by a timeout, dispatch it.
//!
//! # Design
//! All entry points end in [`dispatch`]. They only differ in where the
//! client comes from:
//! - [`call()`] builds a fresh default transport per call.
//! - [`call_with_reqwest`] reuses a caller-owned `reqwest::Client`.
//! - [`call_with`] takes any [`HttpClient`], which is what tests use.
//!
//! The effective deadline is the earlier of the caller's context deadline
//! and `now + CallOptions::timeout` (5000 ms unless configured).

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::{HttpClient, ReqwestClient};
use crate::context::Context;
use crate::error::CallError;
use crate::headers::set_header;
use crate::http::{parse_url, HttpMethod, HttpRequest, HttpResponse};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Environment variable read by [`CallOptions::from_env`], in milliseconds.
pub const TIMEOUT_ENV: &str = "HTTPCALL_TIMEOUT_MS";

/// Pass as the `body` argument when there is nothing to send.
pub const NO_BODY: Option<&()> = None;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub timeout: Duration,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Defaults, with the timeout overridden by `HTTPCALL_TIMEOUT_MS` if set.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(TIMEOUT_ENV).ok().as_deref())
    }

    fn from_env_value(raw: Option<&str>) -> Self {
        let mut options = Self::default();
        if let Some(raw) = raw {
            match raw.trim().parse::<u64>() {
                Ok(ms) => options.timeout = Duration::from_millis(ms),
                Err(e) => warn!(
                    target: "httpcall",
                    value = raw,
                    error = %e,
                    "ignoring invalid {TIMEOUT_ENV}"
                ),
            }
        }
        options
    }
}

/// Build the request a call would send.
///
/// `method` is matched case-insensitively. `body` is serialized to JSON and
/// attached only for POST and PUT; any other method drops it.
pub fn build_request<B, H, K, V>(
    endpoint: &str,
    method: &str,
    body: Option<&B>,
    headers: H,
) -> Result<HttpRequest, CallError>
where
    B: Serialize + ?Sized,
    H: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let method: HttpMethod = method.parse()?;
    let mut request = HttpRequest::new(method, parse_url(endpoint)?);

    if let Some(body) = body {
        if request.method.carries_body() {
            request.body = Some(serde_json::to_vec(body)?);
        } else {
            debug!(target: "httpcall", method = %request.method, "body ignored");
        }
    }

    set_header(&mut request, headers);
    Ok(request)
}

/// Send `request` through `client`, bounded by the caller's context and
/// `options.timeout`, whichever ends first.
pub async fn dispatch<C>(
    ctx: &Context,
    client: &C,
    options: &CallOptions,
    mut request: HttpRequest,
) -> Result<HttpResponse, CallError>
where
    C: HttpClient + ?Sized,
{
    if ctx.is_cancelled() {
        return Err(CallError::Canceled);
    }

    let now = Instant::now();
    // None when `now + timeout` overflows; the caller's deadline still applies.
    let fixed = now.checked_add(options.timeout);
    let deadline = match (ctx.deadline(), fixed) {
        (Some(caller), _) if caller <= now => return Err(CallError::DeadlineExceeded),
        (Some(caller), Some(fixed)) => Some(caller.min(fixed)),
        (caller, fixed) => caller.or(fixed),
    };
    let budget = deadline.map(|deadline| deadline - now);
    request.timeout = budget;

    debug!(
        target: "httpcall",
        method = %request.method,
        url = %request.url,
        timeout = ?budget,
        "sending request"
    );

    let bounded = async {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, client.execute(request))
                .await
                .unwrap_or_else(|_| Err(CallError::Timeout {
                    timeout: deadline - now,
                })),
            None => client.execute(request).await,
        }
    };

    let result = tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(CallError::Canceled),
        res = bounded => res,
    };

    match &result {
        Ok(response) => debug!(target: "httpcall", status = response.status, "response received"),
        Err(e) => debug!(target: "httpcall", error = %e, "request failed"),
    }
    result
}

/// Call `endpoint` with a default transport built for this call only.
pub async fn call<B, H, K, V>(
    ctx: &Context,
    endpoint: &str,
    method: &str,
    body: Option<&B>,
    headers: H,
) -> Result<HttpResponse, CallError>
where
    B: Serialize + ?Sized,
    H: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let client = ReqwestClient::try_new()?;
    call_with(ctx, &client, endpoint, method, body, headers).await
}

/// Call `endpoint` through a caller-owned `reqwest::Client`.
pub async fn call_with_reqwest<B, H, K, V>(
    ctx: &Context,
    client: &reqwest::Client,
    endpoint: &str,
    method: &str,
    body: Option<&B>,
    headers: H,
) -> Result<HttpResponse, CallError>
where
    B: Serialize + ?Sized,
    H: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let client = ReqwestClient::from(client.clone());
    call_with(ctx, &client, endpoint, method, body, headers).await
}

/// Call `endpoint` through any [`HttpClient`].
pub async fn call_with<C, B, H, K, V>(
    ctx: &Context,
    client: &C,
    endpoint: &str,
    method: &str,
    body: Option<&B>,
    headers: H,
) -> Result<HttpResponse, CallError>
where
    C: HttpClient + ?Sized,
    B: Serialize + ?Sized,
    H: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let request = build_request(endpoint, method, body, headers)?;
    dispatch(ctx, client, &CallOptions::default(), request).await
}

/// A client bundled with its call options, for when the fixed timeout
/// needs to be something other than the default.
#[derive(Debug, Clone)]
pub struct Caller<C> {
    client: C,
    options: CallOptions,
}

impl<C: HttpClient> Caller<C> {
    pub fn new(client: C) -> Self {
        Self::with_options(client, CallOptions::default())
    }

    pub fn with_options(client: C, options: CallOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn options(&self) -> &CallOptions {
        &self.options
    }

    pub async fn call<B, H, K, V>(
        &self,
        ctx: &Context,
        endpoint: &str,
        method: &str,
        body: Option<&B>,
        headers: H,
    ) -> Result<HttpResponse, CallError>
    where
        B: Serialize + ?Sized,
        H: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: fmt::Display,
    {
        let request = build_request(endpoint, method, body, headers)?;
        self.send(ctx, request).await
    }

    pub async fn send(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, CallError> {
        dispatch(ctx, &self.client, &self.options, request).await
    }
}

impl Caller<ReqwestClient> {
    /// Default transport, timeout taken from the environment.
    pub fn from_env() -> Result<Self, CallError> {
        Ok(Self::with_options(ReqwestClient::try_new()?, CallOptions::from_env()))
    }
}
