/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;
mod input;
mod output;

mod backpressure;
mod complete;
mod context;
mod handle;
mod pending;
mod service;
mod session;
mod xml;

use crate::error::{self, ErrorKind, UnexpectedStatus};
use crate::http::HttpRequest;
use backpressure::Backpressure;
use context::UploadContext;
pub use handle::UploadWriter;
/// Request type for streamed uploads
pub use input::{UploadInput, UploadInputBuilder};
/// Response type for streamed uploads
pub use output::UploadOutput;
use session::UploadSession;

use http::{Method, StatusCode};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Maximum number of parts that a single multipart upload supports
const MAX_PARTS: u64 = 10_000;

/// Operation struct for a single streamed upload
#[derive(Clone, Default, Debug)]
pub(crate) struct Upload;

impl Upload {
    /// Start the session driving a single upload and hand back its writer
    pub(crate) fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: UploadInput,
    ) -> Result<UploadWriter, error::Error> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(error::from_kind(ErrorKind::RuntimeError))?;

        let min_part_size = handle.min_part_size_bytes();
        let backpressure = Arc::new(Backpressure::new(handle.max_buffered_bytes()));
        tracing::trace!(
            "streaming upload to {} with minimum part size: {min_part_size} bytes",
            input.key()
        );

        let span = tracing::debug_span!("upload-session", key = input.key());
        let ctx = new_context(handle, input);
        let session = UploadSession::new(ctx, min_part_size, backpressure.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(session.run(rx).instrument(span));

        Ok(UploadWriter::new(tx, backpressure, task))
    }
}

fn new_context(handle: Arc<crate::client::Handle>, req: UploadInput) -> UploadContext {
    UploadContext {
        handle,
        request: Arc::new(req),
        upload_id: None,
    }
}

/// start a new multipart upload by sending `POST <key>?uploads`, yielding the upload ID
async fn initiate_upload(ctx: UploadContext) -> Result<String, error::Error> {
    let req = HttpRequest::new(Method::POST, format!("{}?uploads", ctx.request().key()))
        .with_headers(ctx.request().headers().clone());

    let resp = ctx
        .client()
        .send(req)
        .instrument(tracing::debug_span!("send-initiate-multipart-upload"))
        .await
        .map_err(error::from_kind(ErrorKind::InitiationFailed))?;

    if resp.status() != StatusCode::OK {
        let (status, _, body) = resp.into_parts();
        return Err(error::Error::new(
            ErrorKind::InitiationFailed,
            UnexpectedStatus::new(status, body),
        ));
    }

    xml::element_text(resp.body(), "UploadId")
        .map_err(error::from_kind(ErrorKind::InitiationFailed))?
        .filter(|upload_id| !upload_id.is_empty())
        .ok_or_else(|| {
            error::Error::new(
                ErrorKind::InitiationFailed,
                "response did not include an UploadId",
            )
        })
}
