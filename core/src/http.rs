//! HTTP request and response types.
//!
//! # Design
//! These types describe requests and responses as plain owned data. A
//! request is built (directly, through `RequestBuilder`, or by the call
//! family), handed to an `HttpClient` once, and dropped. Nothing in the
//! library reads the response beyond handing it back to the caller.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::CallError;
use crate::headers::Headers;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Any other method token, kept verbatim.
    Extension(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Extension(token) => token,
        }
    }

    /// Whether the call family attaches a JSON body for this method.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard verbs match in any case; anything else must be an HTTP token.
impl FromStr for HttpMethod {
    type Err = CallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ if is_token(s) => HttpMethod::Extension(s.to_string()),
            _ => return Err(CallError::InvalidMethod(s.to_string())),
        };
        Ok(method)
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// Base that relative references such as `"/miep"` are resolved against.
/// Its scheme names no host, so a transport that needs one rejects it.
pub const RELATIVE_BASE: &str = "relative:///";

const RELATIVE_SCHEME: &str = "relative";

/// Parse `raw` as an absolute URL, or as a reference relative to
/// [`RELATIVE_BASE`] when it has no scheme.
pub(crate) fn parse_url(raw: &str) -> Result<Url, CallError> {
    let parsed = match Url::parse(raw) {
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).and_then(|base| base.join(raw))
        }
        other => other,
    };
    parsed.map_err(|source| CallError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
    /// Time budget left when the request was dispatched. Set by `dispatch`;
    /// clients that can enforce a per-request timeout should honor it.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: None,
            timeout: None,
        }
    }

    /// True when the URL came from a relative reference and names no host.
    pub fn is_relative(&self) -> bool {
        self.url.scheme() == RELATIVE_SCHEME
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with the given status and no headers or body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
