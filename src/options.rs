//! Call options and payload types
//!
//! `CallOptions` is what a call site hands to the queue: where the data goes,
//! how it is sent, and optionally a custom handler that replaces the transport.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::job::Handler;

/// Cross-origin mode of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

impl RequestMode {
    /// Methods that may be sent under this mode, or None when any method is allowed
    pub fn allowed_methods(&self) -> Option<&'static [&'static str]> {
        match self {
            RequestMode::NoCors => Some(&["GET", "HEAD", "POST"]),
            _ => None,
        }
    }
}

/// Credential policy of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    #[default]
    Omit,
    SameOrigin,
    Include,
}

impl Credentials {
    /// Whether credential-bearing headers are sent
    pub fn sends_credentials(&self) -> bool {
        !matches!(self, Credentials::Omit)
    }
}

/// Cache policy of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    #[default]
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl CachePolicy {
    /// Request headers that express this policy on the wire
    pub fn headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            CachePolicy::Default => &[],
            CachePolicy::NoStore => &[("cache-control", "no-store")],
            CachePolicy::Reload | CachePolicy::NoCache => &[("cache-control", "no-cache"), ("pragma", "no-cache")],
            CachePolicy::ForceCache => &[("cache-control", "max-stale")],
            CachePolicy::OnlyIfCached => &[("cache-control", "only-if-cached")],
        }
    }
}

/// Per-call options
///
/// Every field is optional; unset transport fields fall back to
/// [`FetchDefaults`](crate::transport::FetchDefaults) when the call is resolved.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallOptions {
    /// Destination URL
    pub url: Option<String>,

    /// HTTP verb (case-insensitive)
    pub method: Option<String>,

    /// Cross-origin mode
    pub mode: Option<RequestMode>,

    /// Credential policy
    pub credentials: Option<Credentials>,

    /// Cache policy
    pub cache: Option<CachePolicy>,

    /// Extra request headers, layered over the defaults
    pub headers: Option<BTreeMap<String, String>>,

    /// Explicit queue key
    pub name: Option<String>,

    /// Operation class; "fetch" means "key by URL"
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Custom handler that replaces the transport
    #[serde(skip)]
    pub handler: Option<Arc<dyn Handler>>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options targeting a URL
    pub fn for_url(url: impl Into<String>) -> Self {
        Self::new().url(url)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Add one header; names are stored lowercase
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Layer `update` over these options
    ///
    /// Fields set in `update` replace the current value; headers are replaced
    /// as a whole, not merged key by key.
    pub fn merge(&mut self, update: CallOptions) {
        debug!(?update, "CallOptions::merge: called");
        let CallOptions {
            url,
            method,
            mode,
            credentials,
            cache,
            headers,
            name,
            kind,
            handler,
        } = update;

        if url.is_some() {
            self.url = url;
        }
        if method.is_some() {
            self.method = method;
        }
        if mode.is_some() {
            self.mode = mode;
        }
        if credentials.is_some() {
            self.credentials = credentials;
        }
        if cache.is_some() {
            self.cache = cache;
        }
        if headers.is_some() {
            self.headers = headers;
        }
        if name.is_some() {
            self.name = name;
        }
        if kind.is_some() {
            self.kind = kind;
        }
        if handler.is_some() {
            self.handler = handler;
        }
    }

    /// True when none of name, type or url is present
    pub fn lacks_destination(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.url.is_none()
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("mode", &self.mode)
            .field("credentials", &self.credentials)
            .field("cache", &self.cache)
            .field("headers", &self.headers)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

/// The extra arguments of one call
///
/// Zero arguments mean no payload, one argument is sent verbatim, and several
/// are sent as an ordered array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Vec<Value>);

impl Payload {
    pub fn new(args: Vec<Value>) -> Self {
        Self(args)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn args(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value that goes on the wire, if any
    ///
    /// A single `null` argument sends nothing, the same as no arguments.
    pub fn data(&self) -> Option<Value> {
        match self.0.as_slice() {
            [] | [Value::Null] => None,
            [single] => Some(single.clone()),
            many => Some(Value::Array(many.to_vec())),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<Value>> for Payload {
    fn from(args: Vec<Value>) -> Self {
        Self(args)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}
