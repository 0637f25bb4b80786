/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::VecDeque;

use bytes::Bytes;

/// Writes received before the multipart upload ID is known.
///
/// Every write is kept, in submission order, until it can be replayed.
#[derive(Debug, Default)]
pub(super) struct PendingWrites {
    writes: VecDeque<Bytes>,
    buffered: u64,
}

impl PendingWrites {
    pub(super) fn push(&mut self, data: Bytes) {
        self.buffered += data.len() as u64;
        self.writes.push_back(data);
    }

    /// Remove all queued writes, oldest first
    pub(super) fn drain(&mut self) -> impl Iterator<Item = Bytes> + '_ {
        self.buffered = 0;
        self.writes.drain(..)
    }

    pub(super) fn len(&self) -> usize {
        self.writes.len()
    }

    /// Total number of queued bytes
    pub(super) fn buffered(&self) -> u64 {
        self.buffered
    }
}
