/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::error;
use crate::http::{HttpClient, SharedHttpClient};
use crate::types::{ConcurrencySetting, PartSize};
use crate::MEBIBYTE;
use std::cmp;

/// Minimum upload part size in bytes
pub(crate) const MIN_MULTIPART_PART_SIZE_BYTES: u64 = 5 * MEBIBYTE;

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    part_size: PartSize,
    concurrency: ConcurrencySetting,
    max_buffered_bytes: Option<u64>,
    http_client: SharedHttpClient,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns a reference to the minimum part size to use for multipart uploads
    pub fn part_size(&self) -> &PartSize {
        &self.part_size
    }

    /// Returns the concurrency setting to use for individual uploads.
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// Returns the explicitly configured backpressure high-water mark, if any.
    pub fn max_buffered_bytes(&self) -> Option<u64> {
        self.max_buffered_bytes
    }

    /// The HTTP client that will be used to send requests to the storage service.
    pub fn http_client(&self) -> &SharedHttpClient {
        &self.http_client
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    part_size: PartSize,
    concurrency: ConcurrencySetting,
    max_buffered_bytes: Option<u64>,
    http_client: Option<SharedHttpClient>,
}

impl Builder {
    /// The minimum size of each part of a multipart upload.
    ///
    /// A part is sent once at least this many bytes have been written since the previous part,
    /// so parts may be larger. Only the final part may be smaller.
    ///
    /// The protocol minimum is 5 MiB, any part size less than that will be rounded up.
    /// Default is [PartSize::Auto]
    pub fn part_size(self, part_size: PartSize) -> Self {
        let part_size = match part_size {
            PartSize::Target(part_size) => {
                PartSize::Target(cmp::max(part_size, MIN_MULTIPART_PART_SIZE_BYTES))
            }
            tps => tps,
        };

        self.set_part_size(part_size)
    }

    /// Minimum part size for a multipart upload.
    ///
    /// NOTE: This does not validate the setting and is meant for internal use only.
    pub(crate) fn set_part_size(mut self, part_size: PartSize) -> Self {
        self.part_size = part_size;
        self
    }

    /// Set the concurrency level this component is allowed to use.
    ///
    /// This sets the maximum number of concurrent in-flight part uploads per upload.
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the number of buffered and in-flight bytes at which writes report
    /// [`WriteStatus::Pause`](crate::types::WriteStatus::Pause).
    ///
    /// Defaults to one part more than the concurrency allows in flight. Values below the
    /// minimum part size are raised to it.
    pub fn max_buffered_bytes(mut self, max_buffered_bytes: u64) -> Self {
        self.max_buffered_bytes = Some(max_buffered_bytes);
        self
    }

    /// Set the HTTP client used to send requests to the storage service.
    pub fn http_client(mut self, http_client: impl HttpClient + 'static) -> Self {
        self.http_client = Some(SharedHttpClient::new(http_client));
        self
    }

    /// Set an already shared HTTP client.
    pub fn shared_http_client(mut self, http_client: SharedHttpClient) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    ///
    /// Fails if no HTTP client was set.
    pub fn build(self) -> Result<Config, error::Error> {
        let http_client = self
            .http_client
            .ok_or_else(|| error::invalid_input("an HTTP client is required"))?;
        Ok(Config {
            part_size: self.part_size,
            concurrency: self.concurrency,
            max_buffered_bytes: self.max_buffered_bytes,
            http_client,
        })
    }
}
