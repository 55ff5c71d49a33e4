//! firewall-server: the network side of the Cosmos node firewall
//!
//! Three listeners (JSON-RPC, gRPC, REST) share one [`PolicyValidator`](firewall_core::PolicyValidator).
//! Allowed requests are answered locally or relayed to a static backend or
//! to the best node of a health-checked [`NodePools`].

pub mod codec;
pub mod error;
pub mod forwarder;
pub mod framing;
pub mod handlers;
pub mod metrics;
pub mod node;
pub mod server;
pub mod splice;
pub mod state;

pub use codec::{Frame, PassthroughCodec, Typed, WireMessage};
pub use error::ServerError;
pub use forwarder::Forwarder;
pub use framing::{encode_frame, FrameError, FrameReader};
pub use node::{NodeHandle, NodePool, NodePools};
pub use server::{FirewallServer, Listeners, ServerBuilder};
pub use splice::{splice, wait_for_shutdown, InboundSink};
pub use state::{FirewallState, SharedState};
