//! HTTP transport built on reqwest
//!
//! Sends one call per `execute`, placing the payload in the query string for
//! read/delete verbs and in a JSON body otherwise, then decodes the response
//! according to its declared content type.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use tracing::debug;

use super::config::{FetchDefaults, ResolvedCall};
use super::query::{append_query, to_query_string};
use super::{Transport, TransportError};
use crate::options::{CallOptions, Payload};

/// Headers withheld when the credential policy is `omit`
const CREDENTIAL_HEADERS: &[&str] = &["authorization", "cookie", "proxy-authorization"];

/// How a response body is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
}

impl ContentKind {
    /// Classify a `content-type` header value; parameters are ignored
    pub fn parse(content_type: Option<&str>) -> Option<Self> {
        let essence = content_type?.split(';').next()?.trim().to_ascii_lowercase();
        let (kind, subtype) = essence.split_once('/')?;

        match (kind.trim(), subtype.trim()) {
            ("application", "json") => Some(ContentKind::Json),
            ("text", sub) if !sub.is_empty() => Some(ContentKind::Text),
            _ => None,
        }
    }
}

/// Default transport: one HTTP request per job
pub struct HttpTransport {
    http: Client,
    defaults: FetchDefaults,
}

impl HttpTransport {
    /// Create a transport with its own HTTP client
    pub fn new(defaults: FetchDefaults) -> Result<Self, TransportError> {
        debug!(?defaults, "HttpTransport::new: called");
        let http = Client::builder().timeout(defaults.timeout()).build()?;
        Ok(Self { http, defaults })
    }

    /// Create a transport sharing an existing client
    pub fn with_client(http: Client, defaults: FetchDefaults) -> Self {
        debug!("HttpTransport::with_client: called");
        Self { http, defaults }
    }

    pub fn defaults(&self) -> &FetchDefaults {
        &self.defaults
    }

    fn build_headers(&self, call: &ResolvedCall) -> Result<HeaderMap, TransportError> {
        debug!(credentials = ?call.credentials, cache = ?call.cache, "HttpTransport::build_headers: called");
        let mut headers = HeaderMap::new();

        for (name, value) in &call.headers {
            if !call.credentials.sends_credentials() && CREDENTIAL_HEADERS.contains(&name.as_str()) {
                debug!(%name, "HttpTransport::build_headers: credentials omitted, dropping header");
                continue;
            }
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        for &(name, value) in call.cache.headers() {
            if !headers.contains_key(name) {
                headers.insert(name, HeaderValue::from_static(value));
            }
        }

        Ok(headers)
    }

    fn build_method(call: &ResolvedCall) -> Result<Method, TransportError> {
        let upper = call.method.to_ascii_uppercase();
        if let Some(allowed) = call.mode.allowed_methods() {
            if !allowed.contains(&upper.as_str()) {
                debug!(method = %upper, mode = ?call.mode, "HttpTransport::build_method: method not allowed for mode");
                return Err(TransportError::InvalidMethod(format!(
                    "'{}' is not allowed in {:?} mode",
                    call.method, call.mode
                )));
            }
        }
        Method::from_bytes(upper.as_bytes()).map_err(|_| TransportError::InvalidMethod(call.method.clone()))
    }

    async fn decode(response: Response) -> Result<Value, TransportError> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(?content_type, "HttpTransport::decode: called");
        match ContentKind::parse(content_type.as_deref()) {
            Some(ContentKind::Json) => {
                let bytes = response.bytes().await?;
                let value: Value = serde_json::from_slice(&bytes)?;
                if value.is_null() {
                    debug!("HttpTransport::decode: JSON body is null");
                    return Err(TransportError::UndecodableContent);
                }
                Ok(value)
            }
            Some(ContentKind::Text) => Ok(Value::String(response.text().await?)),
            None => {
                debug!("HttpTransport::decode: unrecognised content type");
                Err(TransportError::UndecodableContent)
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, options: &CallOptions, payload: &Payload) -> Result<Value, TransportError> {
        let call = self.defaults.resolve(options);
        debug!(url = ?call.url, method = %call.method, args = payload.len(), "HttpTransport::execute: called");

        let url = call.url.as_deref().ok_or(TransportError::MissingUrl)?;
        let method = Self::build_method(&call)?;
        let headers = self.build_headers(&call)?;

        let mut address = url.to_string();
        let mut body = None;
        if let Some(data) = payload.data() {
            if call.payload_in_query() {
                debug!("HttpTransport::execute: payload goes in query string");
                address = append_query(url, &to_query_string(&data));
            } else {
                debug!("HttpTransport::execute: payload goes in JSON body");
                body = Some(serde_json::to_vec(&data)?);
            }
        }

        let target = url::Url::parse(&address).map_err(|e| TransportError::InvalidUrl(format!("{address}: {e}")))?;

        let mut request = self.http.request(method, target).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            debug!(error = %e, "HttpTransport::execute: request produced no response");
            TransportError::NoResponse(e.to_string())
        })?;

        let status = response.status();
        debug!(%status, "HttpTransport::execute: response received");
        if !status.is_success() {
            return Err(TransportError::RemoteStatus(status.as_u16()));
        }

        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CachePolicy, Credentials, RequestMode};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        HttpTransport::new(FetchDefaults::default()).expect("http transport")
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!(ContentKind::parse(Some("application/json")), Some(ContentKind::Json));
        assert_eq!(
            ContentKind::parse(Some("Application/JSON; charset=utf-8")),
            Some(ContentKind::Json)
        );
        assert_eq!(ContentKind::parse(Some("text/plain")), Some(ContentKind::Text));
        assert_eq!(ContentKind::parse(Some("text/html;charset=UTF-8")), Some(ContentKind::Text));
        assert_eq!(ContentKind::parse(Some("application/xml")), None);
        assert_eq!(ContentKind::parse(Some("garbage")), None);
        assert_eq!(ContentKind::parse(None), None);
    }

    #[tokio::test]
    async fn test_post_sends_json_body_and_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/loadData"))
            .and(body_json(json!({"somekey": "some value"})))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        let options = CallOptions::for_url(format!("{}/loadData", server.uri()));
        let result = transport()
            .execute(&options, &Payload::from(json!({"somekey": "some value"})))
            .await
            .unwrap();

        assert_eq!(result, json!({"status": "OK"}));
    }

    #[tokio::test]
    async fn test_multiple_args_sent_as_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!([1, "two"])))
            .respond_with(ResponseTemplate::new(200).set_body_raw("OK", "text/plain"))
            .expect(1)
            .mount(&server)
            .await;

        let options = CallOptions::for_url(server.uri());
        let result = transport()
            .execute(&options, &Payload::new(vec![json!(1), json!("two")]))
            .await
            .unwrap();

        assert_eq!(result, json!("OK"));
    }

    #[tokio::test]
    async fn test_single_null_arg_sends_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("OK", "text/plain"))
            .expect(1)
            .mount(&server)
            .await;

        let options = CallOptions::for_url(server.uri());
        transport()
            .execute(&options, &Payload::from(Value::Null))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_get_sends_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("found", "text/plain; charset=utf-8"))
            .expect(1)
            .mount(&server)
            .await;

        let options = CallOptions::for_url(format!("{}/items", server.uri())).method("get");
        let result = transport()
            .execute(&options, &Payload::from(json!({"page": 2})))
            .await
            .unwrap();

        assert_eq!(result, json!("found"));
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = transport()
            .execute(&CallOptions::for_url(server.uri()), &Payload::empty())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_unknown_content_type_is_undecodable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<a/>", "application/xml"))
            .mount(&server)
            .await;

        let err = transport()
            .execute(&CallOptions::for_url(server.uri()), &Payload::empty())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::UndecodableContent));
    }

    #[tokio::test]
    async fn test_json_null_is_undecodable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("null", "application/json"))
            .mount(&server)
            .await;

        let err = transport()
            .execute(&CallOptions::for_url(server.uri()), &Payload::empty())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::UndecodableContent));
    }

    #[tokio::test]
    async fn test_omit_credentials_drops_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("OK", "text/plain"))
            .mount(&server)
            .await;

        let options = CallOptions::for_url(server.uri()).header("Authorization", "Bearer t");
        transport().execute(&options, &Payload::empty()).await.unwrap();

        let options = options.credentials(Credentials::Include);
        transport().execute(&options, &Payload::empty()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("authorization"));
        assert!(requests[1].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_cache_policy_sets_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("cache-control", "no-store"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("OK", "text/plain"))
            .expect(1)
            .mount(&server)
            .await;

        let options = CallOptions::for_url(server.uri()).cache(CachePolicy::NoStore);
        let result = transport().execute(&options, &Payload::empty()).await.unwrap();
        assert_eq!(result, json!("OK"));
    }

    #[tokio::test]
    async fn test_no_cors_rejects_put() {
        let options = CallOptions::for_url("http://127.0.0.1:9/x")
            .method("put")
            .mode(RequestMode::NoCors);
        let err = transport().execute(&options, &Payload::empty()).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidMethod(_)));
    }

    #[tokio::test]
    async fn test_missing_url() {
        let err = transport()
            .execute(&CallOptions::new().name("beacon"), &Payload::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MissingUrl));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_no_response() {
        // Bind then drop a listener to get a port nobody is serving
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let options = CallOptions::for_url(format!("http://127.0.0.1:{port}/load"));
        let err = transport().execute(&options, &Payload::empty()).await.unwrap_err();
        assert!(err.is_no_response());
    }
}
