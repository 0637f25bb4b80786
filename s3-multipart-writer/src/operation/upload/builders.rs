/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

use super::{UploadInputBuilder, UploadWriter};

/// Fluent builder for constructing a single streamed upload
#[derive(Debug)]
pub struct UploadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: UploadInputBuilder,
}

impl UploadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Start the upload and return the writer to stream the object's bytes to.
    ///
    /// The multipart upload is created when the first non-empty write arrives. Must be
    /// called from within a tokio runtime.
    pub fn initiate(self) -> Result<UploadWriter, Error> {
        let input = self.inner.build()?;
        crate::operation::upload::Upload::orchestrate(self.handle, input)
    }

    /// Object key for which the multipart upload is to be initiated.
    ///
    /// This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key(input);
        self
    }

    /// Object key for which the multipart upload is to be initiated.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key(input);
        self
    }

    /// Object key for which the multipart upload is to be initiated.
    pub fn get_key(&self) -> Option<&str> {
        self.inner.get_key()
    }

    /// Add a header to send when creating the object.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Replace all headers to send when creating the object.
    pub fn set_headers(mut self, input: HeaderMap) -> Self {
        self.inner = self.inner.set_headers(input);
        self
    }

    /// Headers to send when creating the object.
    pub fn get_headers(&self) -> &HeaderMap {
        self.inner.get_headers()
    }
}

impl crate::operation::upload::input::UploadInputBuilder {
    /// Start an upload with this input using the given client.
    pub fn initiate_with(self, client: &crate::Client) -> Result<UploadWriter, Error> {
        let mut fluent_builder = client.upload();
        fluent_builder.inner = self;
        fluent_builder.initiate()
    }
}
