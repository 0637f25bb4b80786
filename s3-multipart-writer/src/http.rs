/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use ::http::header::{HeaderMap, HeaderName, HeaderValue};
use ::http::{Method, StatusCode};
use bytes::Bytes;

use crate::error::BoxError;
use crate::io::AggregatedBytes;

/// Header carrying the base64 encoded MD5 digest of a request body.
pub(crate) const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Sends requests to the storage service.
///
/// Implementations are responsible for resolving [`HttpRequest::path`] against the
/// destination bucket, signing the request and applying any transport level timeouts. The
/// response is returned as-is, no status code is treated as an error at this layer.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync + fmt::Debug {
    /// Send a single request and wait for the complete response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// Reference-counted [`HttpClient`] that can be freely cloned.
#[derive(Debug, Clone)]
pub struct SharedHttpClient(Arc<dyn HttpClient>);

impl SharedHttpClient {
    /// Wrap the given client
    pub fn new(client: impl HttpClient + 'static) -> Self {
        Self(Arc::new(client))
    }

    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        self.0.send(request).await
    }
}

/// A request for one step of the upload protocol.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: AggregatedBytes,
}

impl HttpRequest {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: AggregatedBytes::default(),
        }
    }

    pub(crate) fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub(crate) fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub(crate) fn with_body(mut self, body: AggregatedBytes) -> Self {
        self.body = body;
        self
    }

    /// The request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The object key followed by the protocol query string, e.g. `/photos/cat.jpg?uploads`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request body
    pub fn body(&self) -> &AggregatedBytes {
        &self.body
    }

    /// Consume the request returning the body
    pub fn into_body(self) -> AggregatedBytes {
        self.body
    }
}

/// A response received from the storage service.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    /// Create a response with the given status, no headers and an empty body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header to the response
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the response body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
