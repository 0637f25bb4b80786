/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use bytes::Bytes;
use http::StatusCode;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Walk [`std::error::Error::source`] to display the entire cause chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of upload errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues, including writes after end-of-stream
    InputInvalid,

    /// Some kind of internal runtime issue (e.g. task failure)
    RuntimeError,

    /// The request creating the multipart upload did not yield an upload ID
    InitiationFailed,

    /// Failed to upload a part of the object
    PartUploadFailed(PartFailed),

    /// The request completing the multipart upload could not be sent
    CompletionFailed,

    /// The single empty `PutObject` sent in place of a multipart upload could not be sent
    EmptyUploadFailed,

    /// The upload session stopped before reaching a terminal response, e.g. because the
    /// writer was dropped without signalling end-of-stream.
    OperationCancelled,
}

/// Stores information about a failed part upload
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartFailed {
    part_number: u64,
}

impl PartFailed {
    /// The 1-based number of the part that failed
    pub fn part_number(&self) -> u64 {
        self.part_number
    }
}

impl Error {
    /// Creates a new upload [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The number of the part that failed, if this error is a [`ErrorKind::PartUploadFailed`]
    pub fn part_number(&self) -> Option<u64> {
        match &self.kind {
            ErrorKind::PartUploadFailed(failed) => Some(failed.part_number),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
            ErrorKind::InitiationFailed => write!(f, "failed to initiate multipart upload"),
            ErrorKind::PartUploadFailed(failed) => {
                write!(f, "failed to upload part {}", failed.part_number)
            }
            ErrorKind::CompletionFailed => write!(f, "failed to complete multipart upload"),
            ErrorKind::EmptyUploadFailed => write!(f, "failed to upload empty object"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

/// The storage service answered with a status the protocol step does not accept.
#[derive(Debug)]
pub struct UnexpectedStatus {
    status: StatusCode,
    body: Bytes,
}

impl UnexpectedStatus {
    pub(crate) fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    /// The status code returned by the service
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw response body, usually an XML error document
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl fmt::Display for UnexpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected response status {}", self.status)
    }
}

impl std::error::Error for UnexpectedStatus {}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn part_failed<E>(part_number: u64, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::PartUploadFailed(PartFailed { part_number }), err)
}

pub(crate) fn from_kind<E>(kind: ErrorKind) -> impl FnOnce(E) -> Error
where
    E: Into<BoxError>,
{
    |err| Error::new(kind, err)
}

static CANCELLATION_ERROR: &str =
    "upload session ended before end-of-stream was signalled, no further requests will be sent";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}
