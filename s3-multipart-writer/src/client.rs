/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::config::MIN_MULTIPART_PART_SIZE_BYTES;
use crate::types::{ConcurrencySetting, PartSize};
use crate::Config;
use crate::DEFAULT_CONCURRENCY;
use std::sync::Arc;

/// Upload client for streaming objects to S3-compatible storage.
///
/// Client is cheap to clone and every upload started from it shares the same configuration
/// and HTTP client.
#[derive(Debug, Clone)]
pub struct Client {
    handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. configuration and HTTP client
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: Config,
}

impl Handle {
    /// Get the concrete number of workers to use based on the concurrency setting.
    pub(crate) fn num_workers(&self) -> usize {
        match self.config.concurrency() {
            ConcurrencySetting::Auto => DEFAULT_CONCURRENCY,
            ConcurrencySetting::Explicit(explicit) => (*explicit).max(1),
        }
    }

    /// Get the concrete minimum part size to use for multipart uploads
    pub(crate) fn min_part_size_bytes(&self) -> u64 {
        match self.config.part_size() {
            PartSize::Auto => MIN_MULTIPART_PART_SIZE_BYTES,
            PartSize::Target(explicit) => *explicit,
        }
    }

    /// Buffered and in-flight bytes at which writers are asked to pause.
    ///
    /// Never less than the minimum part size, bytes are only released once a full part has
    /// been uploaded.
    pub(crate) fn max_buffered_bytes(&self) -> u64 {
        let min_part_size = self.min_part_size_bytes();
        self.config
            .max_buffered_bytes()
            .unwrap_or_else(|| min_part_size.saturating_mul(self.num_workers() as u64 + 1))
            .max(min_part_size)
    }
}

impl Client {
    /// Creates a new client from an upload config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle { config });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Stream a single object to storage.
    ///
    /// The returned builder is consumed by
    /// [`initiate`](crate::operation::upload::builders::UploadFluentBuilder::initiate), which
    /// yields an [`UploadWriter`](crate::operation::upload::UploadWriter) the object's bytes
    /// are written to.
    ///
    /// # Examples
    /// ```no_run
    /// use bytes::Bytes;
    /// use s3_multipart_writer::error::Error;
    ///
    /// async fn upload(client: &s3_multipart_writer::Client, chunks: Vec<Bytes>) -> Result<(), Error> {
    ///     let mut writer = client.upload().key("/logs/app.log").initiate()?;
    ///     for chunk in chunks {
    ///         writer.write_all(chunk).await?;
    ///     }
    ///     let output = writer.join().await?;
    ///     println!("upload finished with {}", output.status());
    ///     Ok(())
    /// }
    /// ```
    pub fn upload(&self) -> crate::operation::upload::builders::UploadFluentBuilder {
        crate::operation::upload::builders::UploadFluentBuilder::new(self.handle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::Handle;
    use crate::config::MIN_MULTIPART_PART_SIZE_BYTES;
    use crate::error::BoxError;
    use crate::http::{HttpClient, HttpRequest, HttpResponse};
    use crate::types::ConcurrencySetting;
    use crate::Config;

    #[derive(Debug)]
    struct NoopClient;

    #[async_trait::async_trait]
    impl HttpClient for NoopClient {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, BoxError> {
            Err("not connected".into())
        }
    }

    fn handle_for(builder: crate::config::Builder) -> Handle {
        Handle {
            config: builder.http_client(NoopClient).build().unwrap(),
        }
    }

    #[test]
    fn test_default_high_water_mark() {
        let handle = handle_for(Config::builder().concurrency(ConcurrencySetting::Explicit(2)));
        assert_eq!(3 * MIN_MULTIPART_PART_SIZE_BYTES, handle.max_buffered_bytes());
    }

    #[test]
    fn test_high_water_mark_at_least_one_part() {
        let handle = handle_for(Config::builder().max_buffered_bytes(1024));
        assert_eq!(MIN_MULTIPART_PART_SIZE_BYTES, handle.max_buffered_bytes());

        let handle = handle_for(Config::builder().max_buffered_bytes(0));
        assert_eq!(MIN_MULTIPART_PART_SIZE_BYTES, handle.max_buffered_bytes());

        let larger = 4 * MIN_MULTIPART_PART_SIZE_BYTES;
        let handle = handle_for(Config::builder().max_buffered_bytes(larger));
        assert_eq!(larger, handle.max_buffered_bytes());
    }
}
