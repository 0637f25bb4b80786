/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// The minimum part size for a multipart upload.
#[derive(Debug, Clone, Default)]
pub enum PartSize {
    /// Use the smallest part size the multipart upload protocol accepts (5 MiB).
    #[default]
    Auto,

    /// Minimum part size explicitly given.
    ///
    /// NOTE: Parts are cut once at least this many bytes have accumulated, so an individual
    /// part may be larger than this value.
    Target(u64),
}

/// The concurrency settings to use for a single upload.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencySetting {
    /// Automatically configure an optimal concurrency setting based on the execution environment.
    #[default]
    Auto,

    /// Explicitly configured concurrency setting.
    Explicit(usize),
}

/// Whether a caller should keep writing to an [`UploadWriter`](crate::operation::upload::UploadWriter).
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The write was accepted and buffered bytes are below the high-water mark.
    Ready,

    /// The write was accepted but buffered and in-flight bytes reached the high-water mark.
    ///
    /// Callers should wait on [`UploadWriter::ready`](crate::operation::upload::UploadWriter::ready)
    /// before writing more.
    Pause,
}

/// A part of a multipart upload that was accepted by the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub(crate) part_number: u64,
    pub(crate) e_tag: String,
    pub(crate) size: u64,
}

impl CompletedPart {
    /// The 1-based part number
    pub fn part_number(&self) -> u64 {
        self.part_number
    }

    /// The entity tag returned for this part
    pub fn e_tag(&self) -> &str {
        &self.e_tag
    }

    /// The number of bytes uploaded in this part
    pub fn size(&self) -> u64 {
        self.size
    }
}
