//! In-memory transport doubles.
//!
//! `MemoryResponse` records every write it receives, finalized or not, so
//! callers can assert on how many times a pipeline touched the response.

use crate::context::{ProtoRequest, ProtoResponse};
use crate::errors::ActionError;
use async_trait::async_trait;
use http::Extensions;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    query: Map<String, Value>,
    params: Map<String, Value>,
    body: Value,
    extensions: Extensions,
}

impl MemoryRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new("POST", path).with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

impl ProtoRequest for MemoryRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
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

/// One recorded `emit_*` call.
#[derive(Clone, Debug, PartialEq)]
pub enum Written {
    Structured(Value),
    Raw(String),
    Empty,
}

#[derive(Debug)]
pub struct MemoryResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    writes: Vec<Written>,
}

impl Default for MemoryResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            writes: Vec::new(),
        }
    }
}

impl MemoryResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[Written] {
        &self.writes
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// The first write, i.e. what a real transport would have sent.
    pub fn body(&self) -> Option<&Written> {
        self.writes.first()
    }
}

#[async_trait]
impl ProtoResponse for MemoryResponse {
    fn set_status(&mut self, code: u16) {
        self.status = code;
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    fn is_finalized(&self) -> bool {
        !self.writes.is_empty()
    }

    async fn emit_structured(&mut self, body: Value) -> Result<(), ActionError> {
        self.writes.push(Written::Structured(body));
        Ok(())
    }

    async fn emit_raw(&mut self, body: String) -> Result<(), ActionError> {
        self.writes.push(Written::Raw(body));
        Ok(())
    }

    async fn emit_empty(&mut self) -> Result<(), ActionError> {
        self.writes.push(Written::Empty);
        Ok(())
    }
}
