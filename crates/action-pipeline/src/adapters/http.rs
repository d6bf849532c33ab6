//! Axum transport for compiled actions.
//!
//! Routing stays with the host application; this module only converts an
//! incoming request, runs one compiled action and renders what it wrote.

use crate::compiler::CompiledAction;
use crate::settings::HttpSettings;
use action_types::{to_http_response, ActionError, ProtoRequest, ProtoResponse};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::header::{HeaderName, CONTENT_TYPE};
use axum::http::{Extensions, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

pub struct HttpRequest {
    method: String,
    path: String,
    headers: HeaderMap,
    query: Map<String, Value>,
    params: Map<String, Value>,
    body: Value,
    extensions: Extensions,
}

impl HttpRequest {
    /// Buffers the body (up to `limit` bytes). An empty body reads as `null`;
    /// JSON bodies are parsed, anything else is kept as a string.
    pub async fn from_axum(request: Request<Body>, limit: usize) -> Result<Self, ActionError> {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, limit)
            .await
            .map_err(|err| ActionError::status(400, format!("unreadable request body: {err}")))?;

        let is_json = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json") || value.contains("+json"))
            .unwrap_or(true);
        let body = if bytes.is_empty() {
            Value::Null
        } else if is_json {
            serde_json::from_slice(&bytes)
                .map_err(|err| ActionError::status(400, format!("malformed JSON body: {err}")))?
        } else {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        };

        Ok(Self {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(parse_query).unwrap_or_default(),
            params: Map::new(),
            headers: parts.headers,
            body,
            extensions: parts.extensions,
        })
    }

    /// Attaches route parameters extracted by the host router.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }
}

fn parse_query(query: &str) -> Map<String, Value> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

impl ProtoRequest for HttpRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    fn body(&self) -> &Value {
        &self.body
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

enum Payload {
    Json(Value),
    Text(String),
    Empty,
}

pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    payload: Option<Payload>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            payload: None,
        }
    }
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_response(self) -> Response {
        let mut response = match self.payload {
            Some(Payload::Json(body)) => axum::Json(body).into_response(),
            Some(Payload::Text(body)) => (
                [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
                body,
            )
                .into_response(),
            Some(Payload::Empty) | None => Body::empty().into_response(),
        };
        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        response
    }
}

#[async_trait]
impl ProtoResponse for HttpResponse {
    fn set_status(&mut self, code: u16) {
        self.status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        match (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => warn!(header = name, "dropping invalid response header"),
        }
    }

    fn is_finalized(&self) -> bool {
        self.payload.is_some()
    }

    async fn emit_structured(&mut self, body: Value) -> Result<(), ActionError> {
        self.payload = Some(Payload::Json(body));
        Ok(())
    }

    async fn emit_raw(&mut self, body: String) -> Result<(), ActionError> {
        self.payload = Some(Payload::Text(body));
        Ok(())
    }

    async fn emit_empty(&mut self) -> Result<(), ActionError> {
        self.payload = Some(Payload::Empty);
        Ok(())
    }
}

/// Renders an error nobody recovered.
pub fn error_response(err: &ActionError, expose_details: bool) -> Response {
    let (status, body) = to_http_response(err, expose_details);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(body)).into_response()
}

/// Runs `action` for one HTTP request.
pub async fn dispatch(
    action: &CompiledAction,
    request: Request<Body>,
    settings: &HttpSettings,
) -> Response {
    let mut req = match HttpRequest::from_axum(request, settings.max_body_bytes).await {
        Ok(req) => req,
        Err(err) => {
            debug!(action = action.name(), error = %err, "request rejected before dispatch");
            return error_response(&err, settings.expose_error_details);
        }
    };
    let mut rsp = HttpResponse::new();
    match action.run(&mut req, &mut rsp).await {
        Ok(_) => rsp.into_response(),
        Err(err) if rsp.is_finalized() => {
            warn!(
                action = action.name(),
                code = err.code(),
                error = %err,
                "action failed after writing its response, keeping the written payload"
            );
            rsp.into_response()
        }
        Err(err) => {
            debug!(action = action.name(), code = err.code(), error = %err, "unrecovered action error");
            error_response(&err, settings.expose_error_details)
        }
    }
}

/// Wraps `action` as a closure axum accepts as a route handler.
pub fn into_handler(
    action: CompiledAction,
    settings: HttpSettings,
) -> impl Fn(Request<Body>) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    move |request| {
        let action = action.clone();
        let settings = settings.clone();
        async move { dispatch(&action, request, &settings).await }.boxed()
    }
}
