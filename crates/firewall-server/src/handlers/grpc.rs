//! gRPC endpoint
//!
//! Every method is served by one fallback handler. The first request frame
//! is read and inspected before anything reaches the backend; the call is
//! then spliced through unchanged. Refusals are sent as trailers-only
//! responses, so clients see an ordinary gRPC status.

use async_trait::async_trait;
use axum::body::{Body, BodyDataStream};
use axum::extract::{Request, State};
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use http::header::{self, HeaderName};
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderValue};
use http_body::Frame as BodyFrame;
use http_body_util::StreamBody;
use std::convert::Infallible;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataMap;
use tonic::Status;
use tracing::{debug, warn};

use firewall_core::constants::{GRPC_BROADCAST, GRPC_SIMULATE};
use firewall_core::payload::decode_broadcast_proto;
use firewall_core::{PolicyValidator, Protocol};

use super::{finish, record_failure};
use crate::codec::Frame;
use crate::error::{Result, ServerError};
use crate::forwarder::is_hop_by_hop;
use crate::framing::{encode_frame, FrameError, FrameReader};
use crate::metrics::{OUTCOME_FORWARDED, OUTCOME_LOCAL, OUTCOME_UPSTREAM_ERROR};
use crate::splice::InboundSink;
use crate::state::SharedState;

const GRPC_CONTENT_TYPE: &str = "application/grpc";
const GRPC_STATUS: &str = "grpc-status";
const RESPONSE_BUFFER: usize = 16;

/// Request headers that describe this hop rather than the call
const LOCAL_REQUEST_HEADERS: [&str; 5] = [
    "host",
    "content-length",
    "user-agent",
    "grpc-encoding",
    "grpc-accept-encoding",
];

/// Upstream header fields re-derived for the client
const LOCAL_RESPONSE_HEADERS: [&str; 4] = ["content-type", "content-length", "grpc-status", "grpc-message"];

/// What the splice produced for the client, in order
#[derive(Debug)]
enum ResponseEvent {
    Headers(HeaderMap),
    Data(Bytes),
    Trailers(HeaderMap),
}

/// Client-facing half of a forwarded call
#[derive(Clone)]
struct GrpcResponder {
    events: mpsc::Sender<ResponseEvent>,
}

impl GrpcResponder {
    /// End the call with `status`
    async fn fail(&self, status: Status) {
        let _ = self.events.send(ResponseEvent::Trailers(status_headers(&status))).await;
    }

    async fn send(&self, event: ResponseEvent) -> std::result::Result<(), Status> {
        self.events
            .send(event)
            .await
            .map_err(|_| Status::cancelled("client went away"))
    }
}

#[async_trait]
impl InboundSink for GrpcResponder {
    async fn send_header(&mut self, metadata: MetadataMap) -> std::result::Result<(), Status> {
        let mut headers = metadata.into_headers();
        for name in LOCAL_RESPONSE_HEADERS {
            headers.remove(name);
        }
        strip_hop_by_hop(&mut headers);
        self.send(ResponseEvent::Headers(headers)).await
    }

    async fn send_frame(&mut self, frame: Frame) -> std::result::Result<(), Status> {
        self.send(ResponseEvent::Data(frame.payload)).await
    }

    async fn set_trailer(&mut self, metadata: MetadataMap) {
        let mut trailers = metadata.into_headers();
        trailers
            .entry(GRPC_STATUS)
            .or_insert(HeaderValue::from_static("0"));
        let _ = self.send(ResponseEvent::Trailers(trailers)).await;
    }
}

/// Drop connection-level fields, which HTTP/2 forbids
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let hop: Vec<HeaderName> = headers.keys().filter(|n| is_hop_by_hop(n)).cloned().collect();
    for name in hop {
        headers.remove(name);
    }
}

pub async fn handle(State(state): State<SharedState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    debug!(path = %path, "grpc call");

    let (first, reader) = match inspect(&state.validator, &path, body).await {
        Ok(inspected) => inspected,
        Err(e) => {
            let outcome = record_failure(Protocol::Grpc, &path, &e);
            finish(Protocol::Grpc, start, outcome);
            return trailers_only(status_headers(&e.grpc_status()));
        }
    };

    if !state.forwarder.enabled() {
        finish(Protocol::Grpc, start, OUTCOME_LOCAL);
        return local_reply();
    }

    let method = match PathAndQuery::try_from(path.as_str()) {
        Ok(method) => method,
        Err(e) => {
            finish(Protocol::Grpc, start, OUTCOME_UPSTREAM_ERROR);
            return trailers_only(status_headers(&Status::internal(format!("invalid method path: {e}"))));
        }
    };
    let metadata = request_metadata(&parts.headers);
    let inbound = reader
        .into_stream()
        .map(|frame| frame.map_err(|e| ServerError::from(e).grpc_status()));

    let (events, mut responses) = mpsc::channel(RESPONSE_BUFFER);
    let responder = GrpcResponder { events };
    let forwarder = state.forwarder.clone();
    tokio::spawn(async move {
        let result = forwarder
            .stream_forward(method, metadata, first, inbound, responder.clone())
            .await;
        let outcome = match result {
            Ok(()) => {
                debug!(path = %path, elapsed = ?start.elapsed(), "stream forward finished");
                OUTCOME_FORWARDED
            }
            Err(status) => {
                warn!(path = %path, code = ?status.code(), message = status.message(), "stream forward failed");
                responder.fail(status).await;
                OUTCOME_UPSTREAM_ERROR
            }
        };
        finish(Protocol::Grpc, start, outcome);
    });

    match responses.recv().await {
        Some(event) => respond(event, responses),
        None => trailers_only(status_headers(&Status::internal("forward ended without a response"))),
    }
}

/// Route check, then the first frame and its payload checks
async fn inspect(
    validator: &PolicyValidator,
    path: &str,
    body: Body,
) -> Result<(Frame, FrameReader<BodyDataStream>)> {
    validator.check_route(Protocol::Grpc, path)?;

    let mut reader = FrameReader::new(body.into_data_stream());
    let first = reader.next_frame().await?.ok_or(FrameError::TooShort(0))?;
    check_payload(validator, path, &first.payload)?;
    Ok((first, reader))
}

fn check_payload(validator: &PolicyValidator, path: &str, payload: &[u8]) -> Result<()> {
    if path.eq_ignore_ascii_case(GRPC_SIMULATE) {
        validator.check_simulate(payload)?;
    } else if path.eq_ignore_ascii_case(GRPC_BROADCAST) {
        let broadcast = decode_broadcast_proto(payload)?;
        validator.check_broadcast(&broadcast, true)?;
    }
    Ok(())
}

/// Client metadata to send upstream
fn request_metadata(headers: &HeaderMap) -> MetadataMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || LOCAL_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    MetadataMap::from_headers(forwarded)
}

fn status_headers(status: &Status) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if status.add_header(&mut headers).is_err() {
        headers.insert(GRPC_STATUS, HeaderValue::from(i32::from(status.code())));
    }
    headers
}

fn with_content_type(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(GRPC_CONTENT_TYPE));
    response
}

/// A response carrying only a status, in the headers frame
fn trailers_only(headers: HeaderMap) -> Response {
    let mut response = Response::new(Body::empty());
    *response.headers_mut() = headers;
    with_content_type(response)
}

/// One empty message and an OK status
fn local_reply() -> Response {
    let mut trailers = HeaderMap::new();
    trailers.insert(GRPC_STATUS, HeaderValue::from_static("0"));
    let frames = futures::stream::iter([
        Ok::<_, Infallible>(BodyFrame::data(encode_frame(&[]))),
        Ok(BodyFrame::trailers(trailers)),
    ]);
    with_content_type(Response::new(Body::new(StreamBody::new(frames))))
}

/// Shape the response from the first event the splice produced
fn respond(first: ResponseEvent, rest: mpsc::Receiver<ResponseEvent>) -> Response {
    let (headers, pending) = match first {
        ResponseEvent::Trailers(trailers) => return trailers_only(trailers),
        ResponseEvent::Headers(headers) => (headers, None),
        ResponseEvent::Data(payload) => (HeaderMap::new(), Some(ResponseEvent::Data(payload))),
    };

    let frames = futures::stream::iter(pending)
        .chain(ReceiverStream::new(rest))
        .filter_map(|event| async move {
            match event {
                ResponseEvent::Headers(_) => None,
                ResponseEvent::Data(payload) => Some(Ok::<_, Infallible>(BodyFrame::data(encode_frame(&payload)))),
                ResponseEvent::Trailers(trailers) => Some(Ok(BodyFrame::trailers(trailers))),
            }
        });

    let mut response = Response::new(Body::new(StreamBody::new(frames)));
    *response.headers_mut() = headers;
    with_content_type(response)
}
