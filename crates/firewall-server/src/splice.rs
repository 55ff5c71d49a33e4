//! Bidirectional splice of an inbound gRPC stream onto an upstream stream
//!
//! Two pumps run as separate tasks:
//! - client to upstream: replays the already-read first frame, then every
//!   further inbound frame; inbound end-of-stream half-closes the upstream
//!   send side
//! - upstream to client: forwards leading metadata with the first frame,
//!   then frames, then the trailers; upstream end-of-stream completes the splice
//!
//! The governing task returns on the first pump to fail, or when the upstream
//! side completes. Dropping a pump handle aborts its task, which also drops
//! the upstream call and cancels it.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use http::uri::PathAndQuery;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::wrappers::ReceiverStream;
use tonic::client::Grpc;
use tonic::metadata::MetadataMap;
use tonic::transport::Channel;
use tonic::{Request, Status};
use tracing::debug;

use crate::codec::{Frame, PassthroughCodec};

const OUTBOUND_BUFFER: usize = 16;

/// The client-facing half of a spliced stream
#[async_trait]
pub trait InboundSink: Send + 'static {
    /// Leading metadata; called once, before the first frame
    async fn send_header(&mut self, metadata: MetadataMap) -> Result<(), Status>;

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Status>;

    /// Trailing metadata of a successful upstream stream
    async fn set_trailer(&mut self, metadata: MetadataMap);
}

/// Resolves once `true` is published on the shutdown channel
///
/// A dropped sender means shutdown can no longer be signalled, so this then
/// never resolves.
pub async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

struct Pump<T>(JoinHandle<T>);

impl<T> Drop for Pump<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn join_result(result: Result<Result<(), Status>, JoinError>) -> Result<(), Status> {
    result.unwrap_or_else(|e| Err(Status::internal(format!("forward task failed: {e}"))))
}

/// Relay `inbound` to `method` on `channel` and the replies back into `sink`
#[allow(clippy::too_many_arguments)]
pub async fn splice<S, K>(
    channel: Channel,
    method: PathAndQuery,
    metadata: MetadataMap,
    first: Frame,
    inbound: S,
    sink: K,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Status>
where
    S: Stream<Item = Result<Frame, Status>> + Send + 'static,
    K: InboundSink,
{
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
    let mut request = Request::new(ReceiverStream::new(outbound_rx));
    *request.metadata_mut() = metadata;

    let mut client_pump = Pump(tokio::spawn(pump_client_to_upstream(
        inbound,
        outbound_tx,
        first,
    )));
    let mut upstream_pump = Pump(tokio::spawn(pump_upstream_to_client(
        Grpc::new(channel),
        request,
        method,
        sink,
    )));

    let mut client_done = false;
    loop {
        tokio::select! {
            result = &mut client_pump.0, if !client_done => {
                join_result(result)?;
                debug!("inbound stream finished, upstream send side closed");
                client_done = true;
            }
            result = &mut upstream_pump.0 => {
                return join_result(result);
            }
            _ = wait_for_shutdown(shutdown.clone()) => {
                return Err(Status::unavailable("firewall is shutting down"));
            }
        }
    }
}

async fn pump_client_to_upstream<S>(
    inbound: S,
    outbound: mpsc::Sender<Frame>,
    first: Frame,
) -> Result<(), Status>
where
    S: Stream<Item = Result<Frame, Status>> + Send,
{
    let mut inbound = Box::pin(inbound);
    let mut frame = first;
    loop {
        // a closed upstream request stream means the call already ended;
        // its status arrives through the other pump
        if outbound.send(frame).await.is_err() {
            return Ok(());
        }
        frame = match inbound.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(status)) => return Err(status),
            None => return Ok(()),
        };
    }
}

async fn pump_upstream_to_client<K: InboundSink>(
    mut grpc: Grpc<Channel>,
    request: Request<ReceiverStream<Frame>>,
    method: PathAndQuery,
    mut sink: K,
) -> Result<(), Status> {
    grpc.ready()
        .await
        .map_err(|e| Status::unavailable(format!("upstream not ready: {e}")))?;

    let response = grpc
        .streaming(request, method, PassthroughCodec::<Frame, Frame>::default())
        .await?;
    let (metadata, mut stream, _) = response.into_parts();

    let mut leading = Some(metadata);
    while let Some(frame) = stream.message().await? {
        if let Some(metadata) = leading.take() {
            sink.send_header(metadata).await?;
        }
        sink.send_frame(frame).await?;
    }
    if let Some(metadata) = leading.take() {
        sink.send_header(metadata).await?;
    }

    let trailers = stream.trailers().await?.unwrap_or_default();
    sink.set_trailer(trailers).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_for_shutdown() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_never_signals() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let result = tokio::time::timeout(Duration::from_millis(20), wait_for_shutdown(rx)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_client_pump_sends_first_frame_then_closes() {
        let (tx, mut rx) = mpsc::channel(4);
        let inbound = futures::stream::iter(vec![Ok(Frame::new(&b"second"[..]))]);
        pump_client_to_upstream(inbound, tx, Frame::new(&b"first"[..]))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().payload.as_ref(), b"first");
        assert_eq!(rx.recv().await.unwrap().payload.as_ref(), b"second");
        // sender dropped: the upstream request stream is half-closed
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_client_pump_propagates_inbound_errors() {
        let (tx, _rx) = mpsc::channel(4);
        let inbound = futures::stream::iter(vec![Err(Status::invalid_argument("bad frame"))]);
        let err = pump_client_to_upstream(inbound, tx, Frame::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }
}
