/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use http::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, EXPECT};
use http::Method;
use tracing::Instrument;

use super::xml;
use crate::error::{self, ErrorKind};
use crate::http::{HttpRequest, HttpResponse};
use crate::operation::upload::UploadContext;
use crate::types::CompletedPart;

/// Send `CompleteMultipartUpload` listing `parts`, which must be sorted by part number.
///
/// The response is returned whatever its status.
pub(super) async fn complete_upload(
    ctx: &UploadContext,
    parts: &[CompletedPart],
) -> Result<HttpResponse, error::Error> {
    tracing::trace!("completing multipart upload with {} parts", parts.len());
    let path = format!("{}?uploadId={}", ctx.request().key(), ctx.upload_id());
    let body = xml::complete_manifest(parts);
    let req = HttpRequest::new(Method::POST, path)
        .with_header(CONTENT_LENGTH, HeaderValue::from(body.len()))
        .with_body(body.into());

    let resp = ctx
        .client()
        .send(req)
        .instrument(tracing::debug_span!("send-complete-multipart-upload"))
        .await
        .map_err(error::from_kind(ErrorKind::CompletionFailed))?;

    if !resp.status().is_success() {
        tracing::debug!("complete multipart upload answered with {}", resp.status());
    }
    Ok(resp)
}

/// Create the object with a single empty `PutObject`.
///
/// A multipart upload cannot be completed without parts, so this replaces the whole
/// multipart exchange when nothing was written.
pub(super) async fn put_empty_object(ctx: &UploadContext) -> Result<HttpResponse, error::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(EXPECT, HeaderValue::from_static("100-continue"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(0u64));
    // caller supplied headers take precedence
    headers.extend(ctx.request().headers().clone());

    let req = HttpRequest::new(Method::PUT, ctx.request().key()).with_headers(headers);
    ctx.client()
        .send(req)
        .instrument(tracing::debug_span!("send-put-empty-object"))
        .await
        .map_err(error::from_kind(ErrorKind::EmptyUploadFailed))
}
