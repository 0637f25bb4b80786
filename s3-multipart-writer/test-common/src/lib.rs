/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Scripted HTTP client for exercising uploads without a storage service.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::header::{HeaderValue, ETAG};
use http::{Method, StatusCode};
use s3_multipart_writer::error::BoxError;
use s3_multipart_writer::http::{HttpClient, HttpRequest, HttpResponse};
use tokio::sync::watch;

type Matcher = Box<dyn Fn(&HttpRequest) -> bool + Send + Sync>;
type Responder = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, BoxError> + Send + Sync>;

/// How requests are matched against rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    /// Each request consumes the next rule, which must match.
    Sequential,
    /// Each request is answered by the first matching rule. Rules are never consumed.
    MatchAny,
}

/// A scripted answer for requests matching a predicate.
pub struct Rule {
    matcher: Matcher,
    responder: Responder,
    gate: Option<Gate>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("gated", &self.gate.is_some())
            .finish_non_exhaustive()
    }
}

/// A rule that matches every request and answers `200 OK`.
pub fn rule() -> Rule {
    Rule {
        matcher: Box::new(|_| true),
        responder: Box::new(|_| Ok(HttpResponse::new(StatusCode::OK))),
        gate: None,
    }
}

impl Rule {
    /// Only answer requests for which `matcher` returns true
    pub fn match_requests(
        mut self,
        matcher: impl Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Answer with the response built by `responder`
    pub fn then_response(
        mut self,
        responder: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Self {
        self.responder = Box::new(move |req| Ok(responder(req)));
        self
    }

    /// Fail the request as if the transport broke
    pub fn then_error(mut self, message: &'static str) -> Self {
        self.responder = Box::new(move |_| Err(message.into()));
        self
    }

    /// Hold the response back until `gate` is opened
    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }
}

/// Holds back responses of gated rules until opened.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    /// Create a closed gate
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Release every response waiting on this gate, now and in the future
    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// An [`HttpClient`] answering from a list of [`Rule`]s and capturing every request.
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    mode: RuleMode,
    rules: Mutex<VecDeque<Arc<Rule>>>,
    requests: Mutex<Vec<HttpRequest>>,
    seen: watch::Sender<usize>,
}

impl MockHttpClient {
    /// Create a client answering with `rules`
    pub fn new(mode: RuleMode, rules: Vec<Rule>) -> Self {
        let (seen, _rx) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                mode,
                rules: Mutex::new(rules.into_iter().map(Arc::new).collect()),
                requests: Mutex::new(Vec::new()),
                seen,
            }),
        }
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// Wait until at least `n` requests have been received
    pub async fn wait_for_requests(&self, n: usize) {
        let mut rx = self.inner.seen.subscribe();
        let _ = rx.wait_for(|seen| *seen >= n).await;
    }

    fn find_rule(&self, request: &HttpRequest) -> Result<Arc<Rule>, BoxError> {
        let mut rules = self.inner.rules.lock().unwrap();
        let found = match self.inner.mode {
            RuleMode::Sequential => rules
                .pop_front()
                .filter(|rule| (rule.matcher)(request)),
            RuleMode::MatchAny => rules.iter().find(|rule| (rule.matcher)(request)).cloned(),
        };
        found.ok_or_else(|| {
            format!(
                "no rule matches request {} {}",
                request.method(),
                request.path()
            )
            .into()
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.inner.seen.send_modify(|seen| *seen += 1);

        let rule = self.find_rule(&request)?;
        if let Some(gate) = &rule.gate {
            gate.wait().await;
        }
        (rule.responder)(&request)
    }
}

/// `POST <key>?uploads`
pub fn is_initiate(req: &HttpRequest) -> bool {
    req.method() == Method::POST && req.path().ends_with("?uploads")
}

/// `PUT <key>?partNumber=<n>&uploadId=<id>`
pub fn is_upload_part(req: &HttpRequest) -> bool {
    req.method() == Method::PUT && part_number(req).is_some()
}

/// `POST <key>?uploadId=<id>`
pub fn is_complete(req: &HttpRequest) -> bool {
    req.method() == Method::POST && req.path().contains("?uploadId=")
}

/// `PUT <key>` without a query string
pub fn is_put_object(req: &HttpRequest) -> bool {
    req.method() == Method::PUT && !req.path().contains('?')
}

/// The part number of an upload part request
pub fn part_number(req: &HttpRequest) -> Option<u64> {
    let (_, query) = req.path().split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("partNumber="))
        .and_then(|n| n.parse().ok())
}

/// The ETag the part rules answer with for part `n`
pub fn part_e_tag(n: u64) -> String {
    format!("\"etag-{n}\"")
}

/// Answer the initiate request with `upload_id`
pub fn initiate_rule(upload_id: &'static str) -> Rule {
    rule().match_requests(is_initiate).then_response(move |_| {
        HttpResponse::new(StatusCode::OK).with_body(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <InitiateMultipartUploadResult>\
             <Bucket>test-bucket</Bucket><Key>test-key</Key>\
             <UploadId>{upload_id}</UploadId>\
             </InitiateMultipartUploadResult>"
        ))
    })
}

/// Accept every part, answering with [`part_e_tag`]
pub fn upload_part_rule() -> Rule {
    rule().match_requests(is_upload_part).then_response(|req| {
        let n = part_number(req).unwrap_or_default();
        HttpResponse::new(StatusCode::OK).with_header(
            ETAG,
            HeaderValue::from_str(&part_e_tag(n)).expect("valid header"),
        )
    })
}

/// Accept the completion request
pub fn complete_rule() -> Rule {
    rule().match_requests(is_complete).then_response(|_| {
        HttpResponse::new(StatusCode::OK).with_body(
            "<CompleteMultipartUploadResult><ETag>\"final-etag\"</ETag></CompleteMultipartUploadResult>",
        )
    })
}

/// Accept a single `PutObject`
pub fn put_object_rule() -> Rule {
    rule().match_requests(is_put_object).then_response(|_| {
        HttpResponse::new(StatusCode::OK)
            .with_header(ETAG, HeaderValue::from_static("\"d41d8cd98f00b204e9800998ecf8427e\""))
    })
}

/// Concatenated body of a captured request
pub fn body_bytes(req: &HttpRequest) -> Bytes {
    req.body().clone().into_bytes()
}
