/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::{BoxFuture, Fuse, FusedFuture, FutureExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tracing::Instrument;

use super::backpressure::Backpressure;
use super::complete::{complete_upload, put_empty_object};
use super::pending::PendingWrites;
use super::service::{upload_part_service, UploadPartRequest, UploadPartService};
use super::{initiate_upload, UploadContext, UploadOutput, MAX_PARTS};
use crate::error::{self, Error, ErrorKind};
use crate::io::part_accumulator::PartAccumulator;
use crate::types::CompletedPart;

/// Lifecycle of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SessionState {
    /// Nothing has been written yet, no request has been sent.
    Uninitiated,
    /// `CreateMultipartUpload` is in flight, writes are queued.
    Initiating,
    /// The upload ID is known, writes are accumulated into parts.
    Active,
    /// End-of-stream was signalled, waiting on outstanding parts before completing.
    Finalizing,
    Completed,
    Failed,
}

/// Events sent from the [`UploadWriter`](super::UploadWriter) to its session, in write order.
#[derive(Debug)]
pub(super) enum Command {
    Write(Bytes),
    End,
}

type InitiateFuture = BoxFuture<'static, Result<String, Error>>;

/// Drives one multipart upload from the first write to the final response.
///
/// The session is owned by a single task. Every piece of mutable state (queued writes, the
/// part being accumulated, in-flight part uploads and completed parts) is only touched from
/// [`UploadSession::run`].
#[derive(Debug)]
pub(super) struct UploadSession {
    ctx: UploadContext,
    state: SessionState,
    end_requested: bool,
    pending: PendingWrites,
    accumulator: PartAccumulator,
    total_bytes: u64,
    parts_created: u64,
    part_tasks: JoinSet<Result<CompletedPart, Error>>,
    completed: BTreeMap<u64, CompletedPart>,
    svc: UploadPartService,
    backpressure: Arc<Backpressure>,
}

impl UploadSession {
    pub(super) fn new(ctx: UploadContext, min_part_size: u64, backpressure: Arc<Backpressure>) -> Self {
        let svc = upload_part_service(&ctx);
        Self {
            ctx,
            state: SessionState::Uninitiated,
            end_requested: false,
            pending: PendingWrites::default(),
            accumulator: PartAccumulator::new(min_part_size),
            total_bytes: 0,
            parts_created: 0,
            part_tasks: JoinSet::new(),
            completed: BTreeMap::new(),
            svc,
            backpressure,
        }
    }

    /// Run the session until the upload completes or fails.
    ///
    /// Resolves exactly once with either the final response or the error that ended the
    /// upload.
    pub(super) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<UploadOutput, Error> {
        let result = self.drive(&mut commands).await;
        commands.close();
        self.backpressure.close();
        match &result {
            Ok(_) => {
                self.transition(SessionState::Completed);
                tracing::trace!("upload completed");
            }
            Err(err) => {
                self.transition(SessionState::Failed);
                // in-flight parts are abandoned, queued and accumulated bytes are dropped with self
                self.part_tasks.abort_all();
                tracing::error!(
                    "upload failed after {} parts ({} bytes written): {}",
                    self.parts_created,
                    self.total_bytes,
                    err
                );
            }
        }
        result
    }

    async fn drive(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Result<UploadOutput, Error> {
        let mut initiate: Fuse<InitiateFuture> = Fuse::terminated();
        let mut input_open = true;

        loop {
            if let Some(output) = self.try_complete().await? {
                return Ok(output);
            }

            tokio::select! {
                upload_id = &mut initiate, if !initiate.is_terminated() => {
                    self.on_initiated(upload_id?)?;
                }
                Some(joined) = self.part_tasks.join_next(), if !self.part_tasks.is_empty() => {
                    self.on_part_uploaded(joined??);
                }
                command = commands.recv(), if input_open => match command {
                    Some(Command::Write(data)) => {
                        if let Some(fut) = self.on_write(data)? {
                            initiate = fut.fuse();
                        }
                    }
                    Some(Command::End) => {
                        input_open = false;
                        self.on_end()?;
                    }
                    None => return Err(error::operation_cancelled()),
                },
                else => {
                    return Err(Error::new(
                        ErrorKind::RuntimeError,
                        format!("upload session stalled in state {:?}", self.state),
                    ));
                }
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!("upload session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Handle a write from the caller, returning the initiation future if this write starts
    /// the multipart upload.
    fn on_write(&mut self, data: Bytes) -> Result<Option<InitiateFuture>, Error> {
        if data.is_empty() {
            return Ok(None);
        }

        match self.state {
            SessionState::Uninitiated => {
                self.pending.push(data);
                self.transition(SessionState::Initiating);
                Ok(Some(initiate_upload(self.ctx.clone()).boxed()))
            }
            SessionState::Initiating => {
                self.pending.push(data);
                Ok(None)
            }
            SessionState::Active => {
                self.accumulate(data)?;
                Ok(None)
            }
            SessionState::Finalizing | SessionState::Completed | SessionState::Failed => Err(
                error::invalid_input("write received after end of stream was signalled"),
            ),
        }
    }

    /// Replay queued writes, then apply a pending end-of-stream.
    fn on_initiated(&mut self, upload_id: String) -> Result<(), Error> {
        tracing::trace!(
            "multipart upload started with upload id: {:?}, replaying {} queued writes ({} bytes)",
            upload_id,
            self.pending.len(),
            self.pending.buffered()
        );
        self.ctx.set_upload_id(upload_id);
        self.transition(SessionState::Active);

        let mut pending = mem::take(&mut self.pending);
        for data in pending.drain() {
            self.accumulate(data)?;
        }

        if self.end_requested {
            self.finish_writes()?;
        }
        Ok(())
    }

    fn on_end(&mut self) -> Result<(), Error> {
        self.end_requested = true;
        match self.state {
            // nothing was ever written, no multipart upload exists
            SessionState::Uninitiated => self.transition(SessionState::Finalizing),
            SessionState::Initiating => {
                tracing::trace!("end of stream signalled before the upload id is known");
            }
            SessionState::Active => self.finish_writes()?,
            SessionState::Finalizing | SessionState::Completed | SessionState::Failed => {}
        }
        Ok(())
    }

    fn on_part_uploaded(&mut self, part: CompletedPart) {
        self.backpressure.release(part.size);
        let part_number = part.part_number;
        let previous = self.completed.insert(part_number, part);
        debug_assert!(previous.is_none(), "part {part_number} recorded twice");
    }

    fn accumulate(&mut self, data: Bytes) -> Result<(), Error> {
        self.total_bytes += data.len() as u64;
        self.accumulator.append(data);
        if self.accumulator.threshold_reached() {
            self.upload_part()?;
        }
        Ok(())
    }

    /// Flush whatever has accumulated as the final part.
    fn finish_writes(&mut self) -> Result<(), Error> {
        if !self.accumulator.is_empty() {
            self.upload_part()?;
        }
        self.transition(SessionState::Finalizing);
        Ok(())
    }

    /// Hand the accumulated bytes to a new part upload task.
    fn upload_part(&mut self) -> Result<(), Error> {
        if self.parts_created == MAX_PARTS {
            return Err(error::invalid_input(format!(
                "object exceeds the maximum of {MAX_PARTS} parts for a multipart upload"
            )));
        }

        self.parts_created += 1;
        let part_number = self.parts_created;
        let part = self.accumulator.finalize();
        debug_assert!(part.length > 0, "parts are never empty");
        tracing::trace!(
            "dispatching part {} ({} bytes), {} parts in flight",
            part_number,
            part.length,
            self.part_tasks.len()
        );

        let req = UploadPartRequest {
            ctx: self.ctx.clone(),
            part_number,
            part,
        };
        let svc = self.svc.clone();
        self.part_tasks.spawn(
            svc.oneshot(req)
                .instrument(tracing::debug_span!("upload-part", part_number)),
        );
        Ok(())
    }

    /// Send the final request once end-of-stream was signalled and no part is in flight.
    async fn try_complete(&mut self) -> Result<Option<UploadOutput>, Error> {
        if self.state != SessionState::Finalizing || !self.part_tasks.is_empty() {
            return Ok(None);
        }

        if self.total_bytes == 0 {
            let resp = put_empty_object(&self.ctx).await?;
            return Ok(Some(UploadOutput::new(None, resp, Vec::new(), 0)));
        }

        let parts: Vec<CompletedPart> = mem::take(&mut self.completed).into_values().collect();
        debug_assert!(
            parts
                .iter()
                .zip(1..)
                .all(|(part, expected)| part.part_number == expected),
            "parts must cover 1..=n without gaps"
        );
        debug_assert_eq!(self.parts_created, parts.len() as u64);

        let resp = complete_upload(&self.ctx, &parts).await?;
        Ok(Some(UploadOutput::new(
            self.ctx.upload_id.clone(),
            resp,
            parts,
            self.total_bytes,
        )))
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> SessionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionState, UploadSession};
    use crate::error::{BoxError, ErrorKind};
    use crate::http::{HttpClient, HttpRequest, HttpResponse};
    use crate::operation::upload::backpressure::Backpressure;
    use crate::operation::upload::{new_context, UploadInput};
    use bytes::Bytes;
    use http::header::{HeaderValue, ETAG};
    use http::StatusCode;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct RecordingClient {
        requests: Mutex<Vec<(String, Bytes)>>,
    }

    #[async_trait::async_trait]
    impl HttpClient for Arc<RecordingClient> {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
            let e_tag = HeaderValue::from_str(&format!("\"{}\"", request.path()))?;
            let path = request.path().to_owned();
            self.requests
                .lock()
                .unwrap()
                .push((path, request.into_body().into_bytes()));
            Ok(HttpResponse::new(StatusCode::OK).with_header(ETAG, e_tag))
        }
    }

    fn session(min_part_size: u64) -> (UploadSession, Arc<RecordingClient>) {
        let client = Arc::new(RecordingClient::default());
        let config = crate::Config::builder()
            .http_client(client.clone())
            .build()
            .unwrap();
        let handle = Arc::new(crate::client::Handle { config });
        let input = UploadInput::builder().key("/test/key").build().unwrap();
        let session = UploadSession::new(
            new_context(handle, input),
            min_part_size,
            Arc::new(Backpressure::new(u64::MAX)),
        );
        (session, client)
    }

    async fn drain_parts(session: &mut UploadSession) {
        while let Some(joined) = session.part_tasks.join_next().await {
            session.on_part_uploaded(joined.unwrap().unwrap());
        }
    }

    #[tokio::test]
    async fn test_queued_writes_replayed_in_order() {
        let (mut session, client) = session(4);

        assert!(session.on_write(Bytes::from("ab")).unwrap().is_some());
        assert_eq!(SessionState::Initiating, session.state());
        assert!(session.on_write(Bytes::from("cd")).unwrap().is_none());
        assert_eq!(2, session.pending.len());
        assert_eq!(0, session.parts_created);

        session.on_initiated("upload-1".to_owned()).unwrap();
        assert_eq!(SessionState::Active, session.state());
        assert_eq!(0, session.pending.len());
        assert_eq!(1, session.parts_created);

        assert!(session.on_write(Bytes::from("e")).unwrap().is_none());
        session.on_end().unwrap();
        assert_eq!(SessionState::Finalizing, session.state());
        assert_eq!(2, session.parts_created);

        drain_parts(&mut session).await;
        let mut requests = client.requests.lock().unwrap().clone();
        requests.sort();
        assert_eq!(
            vec![
                (
                    "/test/key?partNumber=1&uploadId=upload-1".to_owned(),
                    Bytes::from("abcd")
                ),
                (
                    "/test/key?partNumber=2&uploadId=upload-1".to_owned(),
                    Bytes::from("e")
                ),
            ],
            requests
        );
        assert_eq!(5, session.total_bytes);
    }

    #[tokio::test]
    async fn test_end_before_upload_id_known() {
        let (mut session, _client) = session(1024);

        assert!(session.on_write(Bytes::from("abc")).unwrap().is_some());
        session.on_end().unwrap();
        assert_eq!(SessionState::Initiating, session.state());

        session.on_initiated("upload-1".to_owned()).unwrap();
        assert_eq!(SessionState::Finalizing, session.state());
        assert_eq!(1, session.parts_created);
        drain_parts(&mut session).await;
        assert_eq!(1, session.completed.len());
    }

    #[tokio::test]
    async fn test_empty_writes_do_not_start_upload() {
        let (mut session, client) = session(4);

        assert!(session.on_write(Bytes::new()).unwrap().is_none());
        assert_eq!(SessionState::Uninitiated, session.state());
        session.on_end().unwrap();
        assert_eq!(SessionState::Finalizing, session.state());

        let output = session.try_complete().await.unwrap().expect("completed");
        assert_eq!(None, output.upload_id());
        assert_eq!(0, output.total_bytes());
        let requests = client.requests.lock().unwrap();
        assert_eq!(1, requests.len());
        assert_eq!("/test/key", requests[0].0);
    }

    #[tokio::test]
    async fn test_write_after_end_rejected() {
        let (mut session, _client) = session(4);
        session.on_end().unwrap();

        let Err(err) = session.on_write(Bytes::from("late")) else {
            panic!("write after end accepted");
        };
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }

    #[tokio::test]
    async fn test_completion_waits_for_in_flight_parts() {
        let (mut session, _client) = session(2);
        let _ = session.on_write(Bytes::from("abcdef")).unwrap();
        session.on_initiated("upload-1".to_owned()).unwrap();
        session.on_end().unwrap();
        assert_eq!(1, session.part_tasks.len());

        assert!(session.try_complete().await.unwrap().is_none());
        drain_parts(&mut session).await;

        let output = session.try_complete().await.unwrap().expect("completed");
        assert_eq!(Some("upload-1"), output.upload_id());
        assert_eq!(1, output.parts().len());
        assert_eq!(6, output.parts()[0].size());
    }
}
