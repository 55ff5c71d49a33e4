//! Protobuf messages for the Cosmos SDK transaction envelope
//!
//! Only the fields the firewall inspects are declared; anything else in the
//! wire bytes is skipped by prost as unknown fields.

/// `google.protobuf.Any`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// `cosmos.base.v1beta1.Coin`
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, serde::Serialize, serde::Deserialize)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// `cosmos.tx.v1beta1.TxRaw`: body and auth info kept as signed bytes
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// `cosmos.tx.v1beta1.Tx`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tx {
    #[prost(message, optional, tag = "1")]
    pub body: Option<TxBody>,
    #[prost(message, optional, tag = "2")]
    pub auth_info: Option<AuthInfo>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
    #[prost(message, repeated, tag = "1023")]
    pub extension_options: Vec<Any>,
    #[prost(message, repeated, tag = "2047")]
    pub non_critical_extension_options: Vec<Any>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
    #[prost(message, optional, tag = "3")]
    pub tip: Option<Tip>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModeInfo {
    #[prost(oneof = "mode_info::Sum", tags = "1, 2")]
    pub sum: Option<mode_info::Sum>,
}

pub mod mode_info {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Single {
        #[prost(enumeration = "super::SignMode", tag = "1")]
        pub mode: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Multi {
        #[prost(message, optional, tag = "1")]
        pub bitarray: Option<super::CompactBitArray>,
        #[prost(message, repeated, tag = "2")]
        pub mode_infos: Vec<super::ModeInfo>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Sum {
        #[prost(message, tag = "1")]
        Single(Single),
        #[prost(message, tag = "2")]
        Multi(Multi),
    }
}

impl ModeInfo {
    pub fn single(mode: SignMode) -> Self {
        Self {
            sum: Some(mode_info::Sum::Single(mode_info::Single { mode: mode as i32 })),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompactBitArray {
    #[prost(uint32, tag = "1")]
    pub extra_bits_stored: u32,
    #[prost(bytes = "vec", tag = "2")]
    pub elems: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tip {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(string, tag = "2")]
    pub tipper: String,
}

/// `cosmos.tx.signing.v1beta1.SignMode`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SignMode {
    Unspecified = 0,
    Direct = 1,
    Textual = 2,
    DirectAux = 3,
    LegacyAminoJson = 127,
    Eip191 = 191,
}

impl SignMode {
    pub fn name(&self) -> &'static str {
        match self {
            SignMode::Unspecified => "SIGN_MODE_UNSPECIFIED",
            SignMode::Direct => "SIGN_MODE_DIRECT",
            SignMode::Textual => "SIGN_MODE_TEXTUAL",
            SignMode::DirectAux => "SIGN_MODE_DIRECT_AUX",
            SignMode::LegacyAminoJson => "SIGN_MODE_LEGACY_AMINO_JSON",
            SignMode::Eip191 => "SIGN_MODE_EIP_191",
        }
    }
}

/// `cosmos.tx.v1beta1.BroadcastMode`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BroadcastMode {
    Unspecified = 0,
    Block = 1,
    Sync = 2,
    Async = 3,
}

impl BroadcastMode {
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastMode::Unspecified => "BROADCAST_MODE_UNSPECIFIED",
            BroadcastMode::Block => "BROADCAST_MODE_BLOCK",
            BroadcastMode::Sync => "BROADCAST_MODE_SYNC",
            BroadcastMode::Async => "BROADCAST_MODE_ASYNC",
        }
    }

    /// Parse the proto enum name as used by the REST gateway
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "BROADCAST_MODE_UNSPECIFIED" | "" => Some(BroadcastMode::Unspecified),
            "BROADCAST_MODE_BLOCK" => Some(BroadcastMode::Block),
            "BROADCAST_MODE_SYNC" => Some(BroadcastMode::Sync),
            "BROADCAST_MODE_ASYNC" => Some(BroadcastMode::Async),
            _ => None,
        }
    }
}

/// `cosmos.tx.v1beta1.SimulateRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimulateRequest {
    /// Deprecated in the SDK but still accepted by nodes
    #[prost(message, optional, tag = "1")]
    pub tx: Option<Tx>,
    #[prost(bytes = "vec", tag = "2")]
    pub tx_bytes: Vec<u8>,
}

/// `cosmos.tx.v1beta1.BroadcastTxRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BroadcastTxRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub tx_bytes: Vec<u8>,
    #[prost(enumeration = "BroadcastMode", tag = "2")]
    pub mode: i32,
}

/// `cosmos.base.tendermint.v1beta1.GetLatestBlockRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetLatestBlockRequest {}

/// `cosmos.base.tendermint.v1beta1.GetLatestBlockResponse`
///
/// Newer nodes fill `sdk_block` alongside the deprecated `block`; both carry
/// the header at tag 1.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetLatestBlockResponse {
    #[prost(message, optional, tag = "2")]
    pub block: Option<Block>,
    #[prost(message, optional, tag = "3")]
    pub sdk_block: Option<Block>,
}

impl GetLatestBlockResponse {
    /// Height of whichever block representation the node returned
    pub fn height(&self) -> Option<i64> {
        self.sdk_block
            .as_ref()
            .or(self.block.as_ref())
            .and_then(|b| b.header.as_ref())
            .map(|h| h.height)
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Block {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(string, tag = "2")]
    pub chain_id: String,
    #[prost(int64, tag = "3")]
    pub height: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_unknown_fields_are_skipped() {
        // TxBody with an extra field 4 (varint) that is not declared here
        let mut bytes = TxBody {
            memo: "hi".into(),
            ..Default::default()
        }
        .encode_to_vec();
        bytes.extend_from_slice(&[0x20, 0x07]);
        let body = TxBody::decode(bytes.as_slice()).unwrap();
        assert_eq!(body.memo, "hi");
    }

    #[test]
    fn test_sign_mode_try_from() {
        assert_eq!(SignMode::try_from(1).unwrap(), SignMode::Direct);
        assert_eq!(SignMode::try_from(191).unwrap(), SignMode::Eip191);
        assert!(SignMode::try_from(42).is_err());
    }

    #[test]
    fn test_broadcast_mode_names() {
        assert_eq!(BroadcastMode::from_name("BROADCAST_MODE_SYNC"), Some(BroadcastMode::Sync));
        assert_eq!(BroadcastMode::from_name(""), Some(BroadcastMode::Unspecified));
        assert_eq!(BroadcastMode::from_name("sync"), None);
        assert_eq!(BroadcastMode::Async.name(), "BROADCAST_MODE_ASYNC");
    }

    #[test]
    fn test_latest_block_height_prefers_sdk_block() {
        let header = |height| Block {
            header: Some(Header {
                chain_id: "fxcore".into(),
                height,
            }),
        };
        let resp = GetLatestBlockResponse {
            block: Some(header(10)),
            sdk_block: Some(header(11)),
        };
        let decoded = GetLatestBlockResponse::decode(resp.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.height(), Some(11));
        assert_eq!(GetLatestBlockResponse::default().height(), None);
    }
}
