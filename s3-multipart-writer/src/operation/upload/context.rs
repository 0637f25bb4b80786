/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::http::SharedHttpClient;
use crate::operation::upload::UploadInput;
use std::ops::Deref;
use std::sync::Arc;

/// Internal context used to drive a single Upload operation
#[derive(Debug, Clone)]
pub(crate) struct UploadContext {
    /// reference to client handle used to do actual work
    pub(crate) handle: Arc<crate::client::Handle>,
    /// the multipart upload ID
    pub(crate) upload_id: Option<String>,
    /// the caller's request
    pub(crate) request: Arc<UploadInput>,
}

impl UploadContext {
    /// The HTTP client to send protocol requests with
    pub(crate) fn client(&self) -> &SharedHttpClient {
        self.handle.config.http_client()
    }

    /// The caller's request
    pub(crate) fn request(&self) -> &UploadInput {
        self.request.deref()
    }

    /// Set the upload ID once the multipart upload has been created
    pub(crate) fn set_upload_id(&mut self, upload_id: String) {
        self.upload_id = Some(upload_id)
    }

    /// The upload ID, only valid once the multipart upload has been created
    pub(crate) fn upload_id(&self) -> &str {
        self.upload_id.as_deref().unwrap_or_default()
    }
}
