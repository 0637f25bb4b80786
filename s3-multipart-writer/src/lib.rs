/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */

//! Streaming multipart upload writer for S3-compatible object storage.
//!
//! Bytes written to an [`UploadWriter`](operation::upload::UploadWriter) are accumulated into
//! parts of at least the configured minimum size and sent with the multipart upload protocol
//! (initiate, upload part, complete). Request signing and endpoint resolution are delegated to
//! an [`HttpClient`](crate::http::HttpClient) supplied by the caller.

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

pub(crate) const MEBIBYTE: u64 = 1024 * 1024;

pub(crate) const DEFAULT_CONCURRENCY: usize = 8;

/// Error types emitted by `s3-multipart-writer`
pub mod error;

/// Common types used by `s3-multipart-writer`
pub mod types;

/// Types and helpers for I/O
pub mod io;

/// The HTTP collaborator used to send protocol requests
pub mod http;

/// Upload client
pub mod client;

/// Upload operations
pub mod operation;

/// Upload client configuration
pub mod config;

pub use self::client::Client;
pub use self::config::Config;
