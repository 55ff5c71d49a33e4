//! Passthrough codec for schema-agnostic gRPC forwarding
//!
//! [`Frame`] payloads are copied in and out untouched, so a stream can be
//! relayed without knowing its protobuf schema. Typed messages still work
//! through [`Typed`], which falls back to regular prost encoding.

use bytes::{Buf, BufMut, Bytes};
use std::marker::PhantomData;
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::Status;

/// One opaque message on a gRPC stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// A message the passthrough codec can carry
pub trait WireMessage: Sized + Send + 'static {
    fn marshal<B: BufMut>(self, buf: &mut B) -> Result<(), Status>;
    fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self, Status>;
}

impl WireMessage for Frame {
    fn marshal<B: BufMut>(self, buf: &mut B) -> Result<(), Status> {
        buf.put_slice(&self.payload);
        Ok(())
    }

    fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self, Status> {
        Ok(Frame::new(buf.copy_to_bytes(buf.remaining())))
    }
}

/// A prost message carried over the passthrough codec
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Typed<M>(pub M);

impl<M> WireMessage for Typed<M>
where
    M: prost::Message + Default + Send + 'static,
{
    fn marshal<B: BufMut>(self, buf: &mut B) -> Result<(), Status> {
        self.0
            .encode(buf)
            .map_err(|e| Status::internal(format!("encode failed: {e}")))
    }

    fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self, Status> {
        M::decode(buf)
            .map(Typed)
            .map_err(|e| Status::internal(format!("decode failed: {e}")))
    }
}

/// Encode `msg` into a standalone buffer
pub fn marshal<M: WireMessage>(msg: M) -> Result<Bytes, Status> {
    let mut buf = bytes::BytesMut::new();
    msg.marshal(&mut buf)?;
    Ok(buf.freeze())
}

/// Decode a message from a standalone buffer
pub fn unmarshal<M: WireMessage>(mut bytes: Bytes) -> Result<M, Status> {
    M::unmarshal(&mut bytes)
}

/// tonic codec over [`WireMessage`]s; defaults to raw frames both ways
pub struct PassthroughCodec<E = Frame, D = Frame>(PhantomData<fn(E) -> D>);

impl<E, D> Default for PassthroughCodec<E, D> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<E, D> Codec for PassthroughCodec<E, D>
where
    E: WireMessage,
    D: WireMessage,
{
    type Encode = E;
    type Decode = D;
    type Encoder = PassthroughEncoder<E>;
    type Decoder = PassthroughDecoder<D>;

    fn encoder(&mut self) -> Self::Encoder {
        PassthroughEncoder(PhantomData)
    }

    fn decoder(&mut self) -> Self::Decoder {
        PassthroughDecoder(PhantomData)
    }
}

pub struct PassthroughEncoder<E>(PhantomData<fn(E)>);

impl<E: WireMessage> Encoder for PassthroughEncoder<E> {
    type Item = E;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.marshal(dst)
    }
}

pub struct PassthroughDecoder<D>(PhantomData<fn() -> D>);

impl<D: WireMessage> Decoder for PassthroughDecoder<D> {
    type Item = D;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        D::unmarshal(src).map(Some)
    }
}
