//! Timeout-bounded JSON HTTP calls over a pluggable client.
//!
//! # Overview
//! Two ways in:
//! - the call family ([`call()`], [`call_with_reqwest`], [`call_with`]) takes
//!   an endpoint, a method, an optional serializable body, and headers, and
//!   returns the raw [`HttpResponse`];
//! - [`RequestBuilder`] assembles an [`HttpRequest`] step by step and hands
//!   it to a client with [`RequestBuilder::send`].
//!
//! # Design
//! - [`HttpClient`] is the only seam to the network. [`ReqwestClient`] is the
//!   real transport; [`FnClient`] fakes one with a closure.
//! - Every dispatch is bounded by the earlier of the caller's [`Context`]
//!   deadline and a fixed timeout (5000 ms by default, see [`CallOptions`]).
//! - Responses are returned as-is: no status checks, no decoding, no retries.

pub mod builder;
pub mod call;
pub mod client;
pub mod context;
pub mod error;
pub mod headers;
pub mod http;

pub use builder::{RequestBuilder, JSON_CONTENT_TYPE};
pub use call::{
    build_request, call, call_with, call_with_reqwest, dispatch, CallOptions, Caller,
    DEFAULT_TIMEOUT, NO_BODY, TIMEOUT_ENV,
};
pub use client::{FnClient, HttpClient, ReqwestClient};
pub use context::Context;
pub use error::{BoxError, CallError};
pub use headers::{set_header, Headers};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RELATIVE_BASE};
