//! Fluent request builder.
//!
//! # Design
//! `RequestBuilder` wraps an `HttpRequest` and mutates it in place. Setters
//! take and return `&mut Self`, so a failed `with_marshal_body` hands the
//! error back without consuming the builder or touching its current body.

use serde::Serialize;

use crate::call::{dispatch, CallOptions};
use crate::client::HttpClient;
use crate::context::Context;
use crate::error::CallError;
use crate::headers::set_header;
use crate::http::{parse_url, HttpMethod, HttpRequest, HttpResponse};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: HttpRequest,
}

impl RequestBuilder {
    /// A GET request for `url` with no headers. `url` may be a relative
    /// reference like `"/miep"`; whether it can be sent is up to the client.
    pub fn new(url: &str) -> Result<Self, CallError> {
        Ok(Self {
            request: HttpRequest::new(HttpMethod::Get, parse_url(url)?),
        })
    }

    /// Like [`RequestBuilder::new`], with a JSON `Content-Type` already set.
    pub fn json(url: &str) -> Result<Self, CallError> {
        let mut builder = Self::new(url)?;
        builder.request.headers.set("Content-Type", JSON_CONTENT_TYPE);
        Ok(builder)
    }

    pub fn method(&mut self, method: HttpMethod) -> &mut Self {
        self.request.method = method;
        self
    }

    pub fn get(&mut self) -> &mut Self {
        self.method(HttpMethod::Get)
    }

    pub fn post(&mut self) -> &mut Self {
        self.method(HttpMethod::Post)
    }

    pub fn put(&mut self) -> &mut Self {
        self.method(HttpMethod::Put)
    }

    pub fn set_header<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: std::fmt::Display,
    {
        set_header(&mut self.request, headers);
        self
    }

    /// Attach `body` as the raw request payload.
    pub fn with_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.request.body = Some(body.into());
        self
    }

    /// Serialize `body` to JSON and attach it. On failure the builder keeps
    /// whatever body it had before.
    pub fn with_marshal_body<T>(&mut self, body: &T) -> Result<&mut Self, CallError>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body)?;
        Ok(self.with_body(payload))
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn into_request(self) -> HttpRequest {
        self.request
    }

    /// Dispatch the built request through `client` under the default
    /// timeout policy.
    pub async fn send<C>(&self, ctx: &Context, client: &C) -> Result<HttpResponse, CallError>
    where
        C: HttpClient + ?Sized,
    {
        dispatch(ctx, client, &CallOptions::default(), self.request.clone()).await
    }
}
