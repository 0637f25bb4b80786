/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::mem;

use base64::Engine;
use bytes::Bytes;

use super::AggregatedBytes;

/// Collects written bytes for the part currently being assembled.
///
/// The MD5 digest is updated as bytes arrive so finalizing a part never re-reads its data.
pub(crate) struct PartAccumulator {
    data: AggregatedBytes,
    length: u64,
    hasher: md5::Context,
    threshold: u64,
}

impl PartAccumulator {
    /// Create an empty accumulator that reports a full part once `threshold` bytes are held
    pub(crate) fn new(threshold: u64) -> Self {
        Self {
            data: AggregatedBytes::default(),
            length: 0,
            hasher: md5::Context::new(),
            threshold,
        }
    }

    pub(crate) fn append(&mut self, chunk: Bytes) {
        self.length += chunk.len() as u64;
        self.hasher.consume(&chunk);
        self.data.push(chunk);
    }

    /// True once the accumulated length has reached the minimum part size
    pub(crate) fn threshold_reached(&self) -> bool {
        self.length >= self.threshold
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Take everything accumulated so far, leaving an empty accumulator behind.
    pub(crate) fn finalize(&mut self) -> PartBuffer {
        let data = mem::take(&mut self.data);
        let length = mem::take(&mut self.length);
        let hasher = mem::replace(&mut self.hasher, md5::Context::new());
        PartBuffer {
            data,
            length,
            digest: hasher.compute().0,
        }
    }
}

impl fmt::Debug for PartAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartAccumulator")
            .field("length", &self.length)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

/// The finalized contents of a single part.
#[derive(Debug, Clone)]
pub(crate) struct PartBuffer {
    pub(crate) data: AggregatedBytes,
    pub(crate) length: u64,
    pub(crate) digest: [u8; 16],
}

impl PartBuffer {
    /// The base64 encoded MD5 digest, as sent in the `Content-MD5` header
    pub(crate) fn content_md5(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::PartAccumulator;
    use bytes::Bytes;

    #[test]
    fn test_threshold_reached_at_exact_size() {
        let mut acc = PartAccumulator::new(10);
        acc.append(Bytes::from_static(b"12345"));
        assert!(!acc.threshold_reached());
        acc.append(Bytes::from_static(b"67890"));
        assert!(acc.threshold_reached());
    }

    #[test]
    fn test_part_not_split_at_threshold() {
        let mut acc = PartAccumulator::new(4);
        acc.append(Bytes::from_static(b"abc"));
        acc.append(Bytes::from_static(b"defgh"));
        assert!(acc.threshold_reached());

        let part = acc.finalize();
        assert_eq!(8, part.length);
        assert_eq!(&b"abcdefgh"[..], &part.data.into_bytes()[..]);
    }

    #[test]
    fn test_finalize_resets_state() {
        let mut acc = PartAccumulator::new(4);
        acc.append(Bytes::from_static(b"first part"));
        let first = acc.finalize();
        assert!(acc.is_empty());
        assert!(!acc.threshold_reached());

        acc.append(Bytes::from_static(b"second"));
        let second = acc.finalize();
        assert_eq!(6, second.length);
        assert_eq!(md5::compute(b"first part").0, first.digest);
        assert_eq!(md5::compute(b"second").0, second.digest);
    }

    #[test]
    fn test_digest_independent_of_chunking() {
        let mut whole = PartAccumulator::new(1);
        whole.append(Bytes::from_static(b"every adolescent dog goes bonkers early"));

        let mut chunked = PartAccumulator::new(1);
        for chunk in b"every adolescent dog goes bonkers early".chunks(7) {
            chunked.append(Bytes::copy_from_slice(chunk));
        }

        assert_eq!(whole.finalize().content_md5(), chunked.finalize().content_md5());
    }

    #[test]
    fn test_random_splits_respect_threshold() {
        for _ in 0..200 {
            let threshold = fastrand::u64(1..64);
            let mut acc = PartAccumulator::new(threshold);
            let mut parts = Vec::new();
            let mut unflushed = 0;
            let mut written = 0;

            for _ in 0..fastrand::usize(0..40) {
                let len = fastrand::usize(0..40);
                let chunk: Vec<u8> = std::iter::repeat_with(|| fastrand::u8(..))
                    .take(len)
                    .collect();
                unflushed += len as u64;
                written += len as u64;
                acc.append(Bytes::from(chunk));

                assert_eq!(unflushed >= threshold, acc.threshold_reached());
                if acc.threshold_reached() {
                    parts.push(acc.finalize());
                    unflushed = 0;
                }
            }
            if !acc.is_empty() {
                parts.push(acc.finalize());
            }

            if let Some((_, full)) = parts.split_last() {
                assert!(full.iter().all(|part| part.length >= threshold));
            }
            assert!(parts.iter().all(|part| part.length > 0));
            assert_eq!(written, parts.iter().map(|part| part.length).sum::<u64>());
            for part in parts {
                let digest = md5::compute(part.data.clone().into_bytes()).0;
                assert_eq!(digest, part.digest);
            }
        }
    }

    #[test]
    fn test_content_md5_of_empty_part() {
        let mut acc = PartAccumulator::new(1);
        assert_eq!("1B2M2Y8AsgTpgAZ/ErA29w==", acc.finalize().content_md5());
    }
}
