/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;
use http::header::{HeaderMap, ETAG};
use http::StatusCode;

use super::xml;
use crate::http::HttpResponse;
use crate::types::CompletedPart;

/// Response type for a streamed upload.
///
/// Holds the storage service's response to the final request of the upload, either
/// `CompleteMultipartUpload` or, when nothing was written, the single empty `PutObject`.
/// The response is relayed whatever its status, check [`UploadOutput::is_success`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct UploadOutput {
    /// ID of the multipart upload, absent if the object was created with a single `PutObject`.
    pub upload_id: Option<String>,

    /// Status of the final response.
    pub status: StatusCode,

    /// Headers of the final response.
    pub headers: HeaderMap,

    /// Body of the final response.
    pub body: Bytes,

    /// Parts uploaded, in ascending part number order.
    pub parts: Vec<CompletedPart>,

    /// Total number of bytes written by the caller.
    pub total_bytes: u64,
}

impl UploadOutput {
    pub(crate) fn new(
        upload_id: Option<String>,
        response: HttpResponse,
        parts: Vec<CompletedPart>,
        total_bytes: u64,
    ) -> Self {
        let (status, headers, body) = response.into_parts();
        Self {
            upload_id,
            status,
            headers,
            body,
            parts,
            total_bytes,
        }
    }

    /// ID of the multipart upload, absent if the object was created with a single `PutObject`.
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Status of the final response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// True if the final response has a success status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Headers of the final response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body of the final response.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parts uploaded, in ascending part number order.
    pub fn parts(&self) -> &[CompletedPart] {
        &self.parts
    }

    /// Total number of bytes written by the caller.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Entity tag of the created object.
    ///
    /// Taken from the `ETag` response header, or from the `CompleteMultipartUploadResult`
    /// document for multipart uploads.
    pub fn e_tag(&self) -> Option<String> {
        if let Some(e_tag) = self.headers.get(ETAG).and_then(|v| v.to_str().ok()) {
            return Some(e_tag.to_owned());
        }
        xml::element_text(&self.body, "ETag").ok().flatten()
    }
}
