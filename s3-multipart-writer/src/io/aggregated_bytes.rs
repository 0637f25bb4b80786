/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::io::IoSlice;

use bytes::{Buf, Bytes};
use bytes_utils::SegmentedBuf;

///
/// Non-contiguous Binary Data Storage
///
/// Bytes written to an upload arrive as a sequence of chunks that are not in contiguous
/// memory. [`AggregatedBytes`] holds the chunks making up a single request body without
/// copying them, provides a view of this data via [`impl Buf`](bytes::Buf), or it can be
/// copied into contiguous storage with [`.into_bytes()`](AggregatedBytes::into_bytes).
#[derive(Debug, Clone)]
pub struct AggregatedBytes(pub(crate) SegmentedBuf<Bytes>);

impl AggregatedBytes {
    /// Convert this buffer into [`Bytes`].
    ///
    /// # Why does this consume `self`?
    /// Technically, [`copy_to_bytes`](bytes::Buf::copy_to_bytes) can be called without ownership of self. However, since this
    /// mutates the underlying buffer such that no data is remaining, it is more misuse resistant to
    /// prevent the caller from attempting to reread the buffer.
    pub fn into_bytes(mut self) -> Bytes {
        self.0.copy_to_bytes(self.0.remaining())
    }

    /// Convert this buffer into an [`Iterator`] of underlying non-contiguous segments of [`Bytes`]
    pub fn into_segments(self) -> impl Iterator<Item = Bytes> {
        self.0.into_inner().into_iter()
    }

    /// Convert this buffer into a `Vec<u8>`
    pub fn to_vec(self) -> Vec<u8> {
        self.0.into_inner().into_iter().flatten().collect()
    }

    /// Total number of bytes held
    pub fn len(&self) -> usize {
        self.0.remaining()
    }

    /// Returns true if no bytes are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a segment without copying it
    pub(crate) fn push(&mut self, segment: Bytes) {
        if !segment.is_empty() {
            self.0.push(segment);
        }
    }
}

impl Default for AggregatedBytes {
    fn default() -> Self {
        Self(SegmentedBuf::new())
    }
}

impl From<Bytes> for AggregatedBytes {
    fn from(value: Bytes) -> Self {
        let mut buf = Self::default();
        buf.push(value);
        buf
    }
}

impl Buf for AggregatedBytes {
    // Forward all methods that SegmentedBuf has custom implementations of.
    fn remaining(&self) -> usize {
        self.0.remaining()
    }

    fn chunk(&self) -> &[u8] {
        self.0.chunk()
    }

    fn chunks_vectored<'a>(&'a self, dst: &mut [IoSlice<'a>]) -> usize {
        self.0.chunks_vectored(dst)
    }

    fn advance(&mut self, cnt: usize) {
        self.0.advance(cnt)
    }

    fn copy_to_bytes(&mut self, len: usize) -> Bytes {
        self.0.copy_to_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::AggregatedBytes;
    use bytes::Bytes;

    #[test]
    fn test_segments_preserve_write_order() {
        let mut buf = AggregatedBytes::default();
        buf.push(Bytes::from_static(b"every "));
        buf.push(Bytes::new());
        buf.push(Bytes::from_static(b"adolescent dog"));
        assert_eq!(20, buf.len());
        assert_eq!(2, buf.clone().into_segments().count());
        assert_eq!(&b"every adolescent dog"[..], &buf.into_bytes()[..]);
    }
}
