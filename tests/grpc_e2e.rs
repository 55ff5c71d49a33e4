//! End-to-end tests for the gRPC surface
//!
//! A tonic client speaking raw frames through `PassthroughCodec` talks to the
//! firewall, which splices allowed calls onto an axum echo upstream.

mod common;

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use firewall_core::constants::{GRPC_BROADCAST, GRPC_SIMULATE};
use firewall_core::proto::{BroadcastMode, BroadcastTxRequest, SimulateRequest};
use firewall_server::{encode_frame, Frame, FrameReader, PassthroughCodec};
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderValue};
use http_body::Frame as BodyFrame;
use http_body_util::StreamBody;
use prost::Message;
use tonic::client::Grpc;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use common::{
    dead_url, forward_config, local_config, serve, underpriced_tx, valid_tx, Firewall, Hits,
    MockServer,
};

const BALANCE: &str = "/cosmos.bank.v1beta1.Query/Balance";

/// Replies with every request frame, then the frame count as a trailer
async fn echo(State(hits): State<Hits>, request: Request) -> Response {
    hits.hit();
    let path = request.uri().path().to_string();
    let mut reader = FrameReader::new(request.into_body().into_data_stream());
    let mut frames = Vec::new();
    while let Ok(Some(frame)) = reader.next_frame().await {
        frames.push(frame);
    }

    let mut trailers = HeaderMap::new();
    trailers.insert("grpc-status", HeaderValue::from_static("0"));
    trailers.insert("x-echo-count", HeaderValue::from(frames.len()));

    let body = frames
        .into_iter()
        .map(|f| Ok::<_, Infallible>(BodyFrame::data(encode_frame(&f.payload))))
        .chain(std::iter::once(Ok(BodyFrame::trailers(trailers))));

    Response::builder()
        .header("content-type", "application/grpc")
        .header("x-upstream-path", path)
        .body(Body::new(StreamBody::new(futures::stream::iter(body))))
        .unwrap()
}

async fn echo_upstream() -> (MockServer, Hits) {
    let hits = Hits::default();
    let router = Router::new().fallback(echo).with_state(hits.clone());
    (serve(router).await, hits)
}

async fn client(url: &str) -> Grpc<Channel> {
    let channel = Endpoint::from_shared(url.to_string())
        .unwrap()
        .connect()
        .await
        .unwrap();
    Grpc::new(channel)
}

async fn unary(grpc: &mut Grpc<Channel>, method: &'static str, payload: Vec<u8>) -> Result<tonic::Response<Frame>, Status> {
    grpc.ready().await.unwrap();
    grpc.unary(
        tonic::Request::new(Frame::new(payload)),
        PathAndQuery::from_static(method),
        PassthroughCodec::<Frame, Frame>::default(),
    )
    .await
}

fn broadcast(tx_bytes: Vec<u8>, mode: BroadcastMode) -> Vec<u8> {
    BroadcastTxRequest {
        tx_bytes,
        mode: mode as i32,
    }
    .encode_to_vec()
}

#[tokio::test]
async fn test_unary_passthrough_is_byte_identical() {
    let (upstream, hits) = echo_upstream().await;
    let firewall = Firewall::start(forward_config(&upstream.url)).await;
    let mut grpc = client(&firewall.grpc_url).await;

    // not valid protobuf; only route membership matters for queries
    let payload = vec![0x0a, 0xff, 0x00, 0x42];
    let response = unary(&mut grpc, BALANCE, payload.clone()).await.unwrap();
    assert_eq!(response.metadata().get("x-upstream-path").unwrap(), BALANCE);
    assert_eq!(response.into_inner().payload.as_ref(), payload.as_slice());
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_client_stream_and_trailers() {
    let (upstream, _hits) = echo_upstream().await;
    let firewall = Firewall::start(forward_config(&upstream.url)).await;
    let mut grpc = client(&firewall.grpc_url).await;
    grpc.ready().await.unwrap();

    let frames = vec![
        Frame::new(&b"first"[..]),
        Frame::new(&b""[..]),
        Frame::new(&b"third"[..]),
    ];
    let response = grpc
        .streaming(
            tonic::Request::new(futures::stream::iter(frames.clone())),
            PathAndQuery::from_static(BALANCE),
            PassthroughCodec::<Frame, Frame>::default(),
        )
        .await
        .unwrap();

    let mut stream = response.into_inner();
    let mut received = Vec::new();
    while let Some(frame) = stream.message().await.unwrap() {
        received.push(frame);
    }
    assert_eq!(received, frames);

    let trailers = stream.trailers().await.unwrap().unwrap();
    assert_eq!(trailers.get("x-echo-count").unwrap(), "3");
}

#[tokio::test]
async fn test_denied_method_is_permission_denied() {
    let (upstream, hits) = echo_upstream().await;
    let firewall = Firewall::start(forward_config(&upstream.url)).await;
    let mut grpc = client(&firewall.grpc_url).await;

    let status = unary(&mut grpc, "/cosmos.upgrade.v1beta1.Msg/SoftwareUpgrade", vec![])
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);
    assert_eq!(hits.count(), 0);
}

#[tokio::test]
async fn test_broadcast_policy() {
    let (upstream, hits) = echo_upstream().await;
    let firewall = Firewall::start(forward_config(&upstream.url)).await;
    let mut grpc = client(&firewall.grpc_url).await;

    let request = broadcast(valid_tx(), BroadcastMode::Sync);
    let response = unary(&mut grpc, GRPC_BROADCAST, request.clone()).await.unwrap();
    assert_eq!(response.into_inner().payload.as_ref(), request.as_slice());

    let status = unary(&mut grpc, GRPC_BROADCAST, broadcast(valid_tx(), BroadcastMode::Unspecified))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::FailedPrecondition);

    let status = unary(&mut grpc, GRPC_BROADCAST, broadcast(underpriced_tx(), BroadcastMode::Sync))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::FailedPrecondition);
    assert!(status.message().contains("fee"));

    let simulate = SimulateRequest {
        tx: None,
        tx_bytes: vec![1, 2, 3],
    };
    let status = unary(&mut grpc, GRPC_SIMULATE, simulate.encode_to_vec())
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_short_frame_is_rejected() {
    let (upstream, hits) = echo_upstream().await;
    let firewall = Firewall::start(forward_config(&upstream.url)).await;
    let http = reqwest::Client::builder()
        .no_proxy()
        .http2_prior_knowledge()
        .build()
        .unwrap();

    let resp = http
        .post(format!("{}{}", firewall.grpc_url, GRPC_BROADCAST))
        .header("content-type", "application/grpc")
        .header("te", "trailers")
        .body(vec![0u8, 0, 0, 1])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers().get("grpc-status").unwrap(), "3");
    assert_eq!(hits.count(), 0);
}

#[tokio::test]
async fn test_local_mode_replies_empty_message() {
    let firewall = Firewall::start(local_config()).await;
    let mut grpc = client(&firewall.grpc_url).await;

    let response = unary(&mut grpc, BALANCE, vec![1, 2, 3]).await.unwrap();
    assert!(response.into_inner().is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_fails_the_call() {
    let firewall = Firewall::start(forward_config(&dead_url().await)).await;
    let mut grpc = client(&firewall.grpc_url).await;

    let status = unary(&mut grpc, BALANCE, vec![]).await.unwrap_err();
    assert!(
        matches!(status.code(), Code::Unavailable | Code::Unknown),
        "unexpected status {status:?}"
    );
}
