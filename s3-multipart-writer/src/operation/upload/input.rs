/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error;

/// Request type for streaming an object to storage with a multipart upload
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct UploadInput {
    /// Object key, passed to the HTTP client as the request path.
    pub key: String,

    /// Headers sent with the request creating the multipart upload (e.g. `Content-Type`,
    /// `x-amz-meta-*`), or with the single `PutObject` when nothing was written.
    pub headers: HeaderMap,
}

impl UploadInput {
    /// Creates a new builder-style object to manufacture [`UploadInput`].
    pub fn builder() -> UploadInputBuilder {
        UploadInputBuilder::default()
    }

    /// Object key, passed to the HTTP client as the request path.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Headers sent with the request creating the object.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// A builder for [`UploadInput`].
#[non_exhaustive]
#[derive(Clone, Default, Debug)]
pub struct UploadInputBuilder {
    pub(crate) key: Option<String>,
    pub(crate) headers: HeaderMap,
}

impl UploadInputBuilder {
    /// Object key for which the multipart upload is to be initiated.
    ///
    /// This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Object key for which the multipart upload is to be initiated.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.key = input;
        self
    }

    /// Object key for which the multipart upload is to be initiated.
    pub fn get_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Add a header to send when creating the object.
    ///
    /// Setting the same header twice replaces the earlier value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace all headers to send when creating the object.
    pub fn set_headers(mut self, input: HeaderMap) -> Self {
        self.headers = input;
        self
    }

    /// Headers to send when creating the object.
    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consumes the builder and constructs an [`UploadInput`]
    pub fn build(self) -> Result<UploadInput, error::Error> {
        let key = match self.key {
            Some(key) if !key.is_empty() => key,
            _ => return Err(error::invalid_input("an object key is required")),
        };
        Ok(UploadInput {
            key,
            headers: self.headers,
        })
    }
}
