/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::backpressure::Backpressure;
use super::session::Command;
use super::UploadOutput;
use crate::error::{self, Error, ErrorKind};
use crate::types::WriteStatus;

/// Writer for a single streamed upload.
///
/// Bytes passed to [`write`](Self::write) are uploaded in order. Once everything has been
/// written, [`join`](Self::join) signals end-of-stream and waits for the final response.
///
/// # Cancellation
///
/// Dropping the writer without calling [`end`](Self::end) or [`join`](Self::join) cancels
/// the upload: no new part uploads are started and in-flight ones are aborted at their
/// await points. The multipart upload itself is left for the storage service's lifecycle
/// rules to clean up.
#[derive(Debug)]
#[non_exhaustive]
pub struct UploadWriter {
    commands: Option<mpsc::UnboundedSender<Command>>,
    backpressure: Arc<Backpressure>,
    session: JoinHandle<Result<UploadOutput, Error>>,
}

impl UploadWriter {
    pub(super) fn new(
        commands: mpsc::UnboundedSender<Command>,
        backpressure: Arc<Backpressure>,
        session: JoinHandle<Result<UploadOutput, Error>>,
    ) -> Self {
        Self {
            commands: Some(commands),
            backpressure,
            session,
        }
    }

    /// Queue `data` for upload.
    ///
    /// The write is always accepted while the upload is running. The returned
    /// [`WriteStatus`] tells whether buffered and in-flight bytes have reached the
    /// configured high-water mark, in which case the caller should wait on
    /// [`ready`](Self::ready) before writing more.
    ///
    /// Fails if end-of-stream was already signalled or if the upload has already failed. In
    /// the latter case [`join`](Self::join) returns the error that ended the upload.
    pub fn write(&mut self, data: impl Into<Bytes>) -> Result<WriteStatus, Error> {
        let data = data.into();
        let commands = self.commands.as_ref().ok_or_else(|| {
            error::invalid_input("write called after end of stream was signalled")
        })?;

        let len = data.len() as u64;
        // account before sending, the session may release these bytes as soon as it has them
        let status = self.backpressure.acquire(len);
        if commands.send(Command::Write(data)).is_err() {
            self.backpressure.release(len);
            return Err(Error::new(
                ErrorKind::OperationCancelled,
                "the upload session has already ended, join the writer for its outcome",
            ));
        }
        Ok(status)
    }

    /// Write `data`, waiting for buffered bytes to drain if the write reached the high-water mark.
    pub async fn write_all(&mut self, data: impl Into<Bytes>) -> Result<(), Error> {
        if self.write(data)? == WriteStatus::Pause {
            self.ready().await;
        }
        Ok(())
    }

    /// Wait until buffered and in-flight bytes drop below the high-water mark.
    ///
    /// Resolves immediately once the upload has ended.
    pub async fn ready(&self) {
        self.backpressure.ready().await
    }

    /// Number of written bytes not yet acknowledged by the storage service.
    pub fn buffered_bytes(&self) -> u64 {
        self.backpressure.buffered()
    }

    /// Signal end-of-stream.
    ///
    /// Whatever has been written but not yet sent becomes the final part. Calling this more
    /// than once has no further effect.
    pub fn end(&mut self) {
        if let Some(commands) = self.commands.take() {
            // a closed channel means the session already ended; join reports how
            let _ = commands.send(Command::End);
        }
    }

    /// Signal end-of-stream (if not done already) and wait for the upload to finish.
    ///
    /// Resolves to the storage service's response to the final request of the upload, or to
    /// the error that ended it.
    #[tracing::instrument(skip_all, level = "debug", name = "join-upload")]
    pub async fn join(mut self) -> Result<UploadOutput, Error> {
        self.end();
        self.session.await?
    }
}
