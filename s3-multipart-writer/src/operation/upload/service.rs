/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use http::header::{HeaderValue, CONTENT_LENGTH, ETAG};
use http::{Method, StatusCode};
use tower::util::BoxCloneService;
use tower::{service_fn, ServiceBuilder};
use tracing::Instrument;

use crate::error::{self, UnexpectedStatus};
use crate::http::{HttpRequest, CONTENT_MD5};
use crate::io::part_accumulator::PartBuffer;
use crate::operation::upload::UploadContext;
use crate::types::CompletedPart;

/// Request/input type for our "upload_part" service.
#[derive(Debug, Clone)]
pub(super) struct UploadPartRequest {
    pub(super) ctx: UploadContext,
    pub(super) part_number: u64,
    pub(super) part: PartBuffer,
}

/// The service parts are sent through, shared by every part of one upload.
pub(super) type UploadPartService = BoxCloneService<UploadPartRequest, CompletedPart, error::Error>;

/// handler (service fn) for a single part
async fn upload_part_handler(request: UploadPartRequest) -> Result<CompletedPart, error::Error> {
    let UploadPartRequest {
        ctx,
        part_number,
        part,
    } = request;
    let size = part.length;
    let content_md5 = HeaderValue::from_str(&part.content_md5())
        .map_err(|err| error::part_failed(part_number, err))?;

    let path = format!(
        "{}?partNumber={}&uploadId={}",
        ctx.request().key(),
        part_number,
        ctx.upload_id()
    );
    let req = HttpRequest::new(Method::PUT, path)
        .with_header(CONTENT_LENGTH, HeaderValue::from(size))
        .with_header(CONTENT_MD5, content_md5)
        .with_body(part.data);

    let resp = ctx
        .client()
        .send(req)
        .instrument(tracing::debug_span!("send-upload-part", part_number))
        .await
        .map_err(|err| error::part_failed(part_number, err))?;

    if resp.status() != StatusCode::OK {
        let (status, _, body) = resp.into_parts();
        return Err(error::part_failed(
            part_number,
            UnexpectedStatus::new(status, body),
        ));
    }

    let e_tag = resp
        .headers()
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| error::part_failed(part_number, "response is missing the ETag header"))?;

    tracing::trace!("completed upload of part number {}", part_number);
    Ok(CompletedPart {
        part_number,
        e_tag: e_tag.to_owned(),
        size,
    })
}

/// Create a new tower::Service for uploading individual parts of an object
pub(super) fn upload_part_service(ctx: &UploadContext) -> UploadPartService {
    let svc = service_fn(upload_part_handler);
    let svc = ServiceBuilder::new()
        .concurrency_limit(ctx.handle.num_workers())
        .service(svc);
    BoxCloneService::new(svc)
}

#[cfg(test)]
mod tests {
    use super::{upload_part_service, UploadPartRequest};
    use crate::error::{BoxError, UnexpectedStatus};
    use crate::http::{HttpClient, HttpRequest, HttpResponse};
    use crate::io::part_accumulator::PartAccumulator;
    use crate::operation::upload::{UploadContext, UploadInput};
    use bytes::Bytes;
    use http::header::{HeaderValue, ETAG};
    use http::StatusCode;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct StaticResponse {
        status: StatusCode,
        e_tag: Option<&'static str>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait::async_trait]
    impl HttpClient for Arc<StaticResponse> {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
            self.seen.lock().unwrap().push(request);
            let mut resp = HttpResponse::new(self.status);
            if let Some(e_tag) = self.e_tag {
                resp = resp.with_header(ETAG, HeaderValue::from_static(e_tag));
            }
            Ok(resp)
        }
    }

    fn request(client: Arc<StaticResponse>, body: &'static [u8]) -> UploadPartRequest {
        let config = crate::Config::builder()
            .http_client(client)
            .build()
            .unwrap();
        let mut ctx = UploadContext {
            handle: Arc::new(crate::client::Handle { config }),
            upload_id: None,
            request: Arc::new(UploadInput::builder().key("/test/key").build().unwrap()),
        };
        ctx.set_upload_id("upload-1".to_owned());

        let mut acc = PartAccumulator::new(1);
        acc.append(Bytes::from_static(body));
        UploadPartRequest {
            ctx,
            part_number: 3,
            part: acc.finalize(),
        }
    }

    #[tokio::test]
    async fn test_part_request_shape() {
        let client = Arc::new(StaticResponse {
            status: StatusCode::OK,
            e_tag: Some("\"etag-3\""),
            seen: Mutex::new(Vec::new()),
        });
        let req = request(client.clone(), b"hello world");
        let svc = upload_part_service(&req.ctx);

        let completed = svc.oneshot(req).await.unwrap();
        assert_eq!(3, completed.part_number());
        assert_eq!("\"etag-3\"", completed.e_tag());
        assert_eq!(11, completed.size());

        let seen = client.seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(http::Method::PUT, sent.method());
        assert_eq!("/test/key?partNumber=3&uploadId=upload-1", sent.path());
        assert_eq!("11", sent.headers()["content-length"]);
        assert_eq!("XrY7u+Ae7tCTyyK7j1rNww==", sent.headers()["content-md5"]);
        assert_eq!(&b"hello world"[..], &sent.body().clone().into_bytes()[..]);
    }

    #[tokio::test]
    async fn test_non_200_fails_part() {
        let client = Arc::new(StaticResponse {
            status: StatusCode::FORBIDDEN,
            e_tag: None,
            seen: Mutex::new(Vec::new()),
        });
        let req = request(client, b"denied");
        let svc = upload_part_service(&req.ctx);

        let err = svc.oneshot(req).await.unwrap_err();
        assert_eq!(Some(3), err.part_number());
        let status = std::error::Error::source(&err)
            .and_then(|s| s.downcast_ref::<UnexpectedStatus>())
            .map(|s| s.status());
        assert_eq!(Some(StatusCode::FORBIDDEN), status);
    }

    #[tokio::test]
    async fn test_missing_e_tag_fails_part() {
        let client = Arc::new(StaticResponse {
            status: StatusCode::OK,
            e_tag: None,
            seen: Mutex::new(Vec::new()),
        });
        let req = request(client, b"no tag");
        let svc = upload_part_service(&req.ctx);

        let err = svc.oneshot(req).await.unwrap_err();
        assert_eq!(Some(3), err.part_number());
    }
}
