//! Transaction policy enforcement
//!
//! [`PolicyValidator`] decodes a signed transaction and applies the
//! [`ChainPolicy`] rule set. Checks run in a fixed order and stop at the
//! first violation:
//!
//! 1. signature count and length
//! 2. gas limit
//! 3. auth info (fee granter/payer, signer infos, public keys, sign modes)
//! 4. fee, unless a message type is whitelisted
//! 5. body (memo, extension options, message types)

use prost::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::{
    DEFAULT_MAX_MEMO, DEFAULT_MINIMUM_GAS_LIMIT, ETH_SECP256K1_PUBKEY, PUBLIC_KEY_LEN,
    SECP256K1_PUBKEY,
};
use crate::proto::{mode_info, AuthInfo, Coin, Fee, SignMode, Tx, TxBody, TxRaw};
use crate::{Error, PolicyViolation, Protocol, Result, RouteRegistry};

/// Rule thresholds applied to every inspected transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPolicy {
    /// Application identity used to resolve the built-in route tables
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_minimum_gas_limit")]
    pub minimum_gas_limit: u64,
    /// Accepted fees; a transaction must pay at least one of them in full
    #[serde(default)]
    pub minimum_fee: Vec<Coin>,
    #[serde(default = "default_max_memo")]
    pub max_memo: usize,
    /// Message type URLs that exempt a transaction from the fee check
    #[serde(default, alias = "white_routers")]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub extension_options: bool,
    #[serde(default)]
    pub non_critical_extension_options: bool,
    #[serde(default)]
    pub granter: bool,
    #[serde(default)]
    pub payer: bool,
    #[serde(default = "default_one")]
    pub signer_infos: usize,
    #[serde(default = "default_one")]
    pub minimum_signatures: usize,
    #[serde(default = "default_public_key_type_urls", alias = "public_key_type_url")]
    pub public_key_type_urls: Vec<String>,
}

fn default_chain_id() -> String {
    "cosmoshub".to_string()
}

fn default_minimum_gas_limit() -> u64 {
    DEFAULT_MINIMUM_GAS_LIMIT
}

fn default_max_memo() -> usize {
    DEFAULT_MAX_MEMO
}

fn default_one() -> usize {
    1
}

fn default_public_key_type_urls() -> Vec<String> {
    vec![SECP256K1_PUBKEY.to_string(), ETH_SECP256K1_PUBKEY.to_string()]
}

impl Default for ChainPolicy {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            minimum_gas_limit: default_minimum_gas_limit(),
            minimum_fee: Vec::new(),
            max_memo: default_max_memo(),
            whitelist: Vec::new(),
            extension_options: false,
            non_critical_extension_options: false,
            granter: false,
            payer: false,
            signer_infos: default_one(),
            minimum_signatures: default_one(),
            public_key_type_urls: default_public_key_type_urls(),
        }
    }
}

impl ChainPolicy {
    /// Reject thresholds that can never be satisfied or parsed
    pub fn validate_basic(&self) -> Result<()> {
        if self.chain_id.is_empty() {
            return Err(Error::Config("chain_id must not be empty".into()));
        }
        for coin in &self.minimum_fee {
            if coin.denom.is_empty() {
                return Err(Error::Config(format!("minimum fee {coin} has no denom")));
            }
            parse_amount(&coin.amount)
                .map_err(|_| Error::Config(format!("invalid minimum fee amount {:?}", coin.amount)))?;
        }
        if self.public_key_type_urls.is_empty() {
            return Err(Error::Config("public_key_type_urls must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_amount(amount: &str) -> Result<u128> {
    amount
        .trim()
        .parse::<u128>()
        .map_err(|_| Error::Decode(format!("invalid coin amount {amount:?}")))
}

/// Applies a [`ChainPolicy`] and answers allow-list queries
#[derive(Debug)]
pub struct PolicyValidator {
    policy: ChainPolicy,
    routes: Arc<RouteRegistry>,
    whitelist: HashSet<String>,
}

impl PolicyValidator {
    pub fn new(policy: ChainPolicy, routes: Arc<RouteRegistry>) -> Self {
        let whitelist = policy.whitelist.iter().cloned().collect();
        Self {
            policy,
            routes,
            whitelist,
        }
    }

    pub fn policy(&self) -> &ChainPolicy {
        &self.policy
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    pub fn is_allowed(&self, protocol: Protocol, path: &str) -> bool {
        self.routes.is_allowed(protocol, path)
    }

    /// Like [`is_allowed`](Self::is_allowed) but as a `RouteDenied` error
    pub fn check_route(&self, protocol: Protocol, path: &str) -> Result<()> {
        if self.is_allowed(protocol, path) {
            Ok(())
        } else {
            Err(Error::RouteDenied {
                protocol,
                path: path.to_string(),
            })
        }
    }

    /// Decode a signed `TxRaw` and apply every rule
    pub fn check_tx_bytes(&self, raw: &[u8]) -> Result<()> {
        let tx = TxRaw::decode(raw)?;

        if tx.signatures.len() < self.policy.minimum_signatures {
            return Err(PolicyViolation::TooFewSignatures {
                got: tx.signatures.len(),
                min: self.policy.minimum_signatures,
            }
            .into());
        }
        check_signature_lengths(&tx.signatures)?;

        let auth_info = AuthInfo::decode(tx.auth_info_bytes.as_slice())?;
        self.check_gas(auth_info.fee.as_ref())?;
        self.check_tx_auth_info(&auth_info)?;

        let body = TxBody::decode(tx.body_bytes.as_slice())?;
        self.check_fee(&body, auth_info.fee.as_ref())?;
        self.check_tx_body(&body)
    }

    /// Checks for a decoded `Tx`, as carried inline by simulate requests
    ///
    /// Signature lengths are checked but not their count.
    pub fn check_tx(&self, tx: &Tx) -> Result<()> {
        check_signature_lengths(&tx.signatures)?;
        let auth_info = tx
            .auth_info
            .as_ref()
            .ok_or_else(|| Error::Decode("transaction has no auth info".into()))?;
        let body = tx
            .body
            .as_ref()
            .ok_or_else(|| Error::Decode("transaction has no body".into()))?;
        self.check_tx_auth_info(auth_info)?;
        self.check_tx_body(body)
    }

    pub fn check_tx_body(&self, body: &TxBody) -> Result<()> {
        if body.memo.len() > self.policy.max_memo {
            return Err(PolicyViolation::MemoTooLong {
                len: body.memo.len(),
                max: self.policy.max_memo,
            }
            .into());
        }
        if !self.policy.extension_options && !body.extension_options.is_empty() {
            return Err(PolicyViolation::IllegalExtensionOptions("extension_options").into());
        }
        if !self.policy.non_critical_extension_options
            && !body.non_critical_extension_options.is_empty()
        {
            return Err(
                PolicyViolation::IllegalExtensionOptions("non_critical_extension_options").into(),
            );
        }
        if body.messages.is_empty() {
            return Err(PolicyViolation::EmptyMessages.into());
        }
        for msg in &body.messages {
            if msg.type_url.is_empty() || !self.routes.is_allowed(Protocol::Grpc, &msg.type_url) {
                return Err(PolicyViolation::UnsupportedMessageType(msg.type_url.clone()).into());
            }
        }
        Ok(())
    }

    pub fn check_tx_auth_info(&self, auth_info: &AuthInfo) -> Result<()> {
        if let Some(fee) = &auth_info.fee {
            if !self.policy.granter && !fee.granter.is_empty() {
                return Err(PolicyViolation::IllegalGranterOrPayer("granter").into());
            }
            if !self.policy.payer && !fee.payer.is_empty() {
                return Err(PolicyViolation::IllegalGranterOrPayer("payer").into());
            }
        }

        if auth_info.signer_infos.len() < self.policy.signer_infos {
            return Err(PolicyViolation::TooFewSignerInfos {
                got: auth_info.signer_infos.len(),
                min: self.policy.signer_infos,
            }
            .into());
        }

        for signer in &auth_info.signer_infos {
            let key = signer
                .public_key
                .as_ref()
                .ok_or_else(|| PolicyViolation::BadPublicKey("missing public key".into()))?;
            if !self.policy.public_key_type_urls.iter().any(|t| *t == key.type_url) {
                return Err(PolicyViolation::BadPublicKey(format!(
                    "unsupported type {:?}",
                    key.type_url
                ))
                .into());
            }
            if key.value.len() != PUBLIC_KEY_LEN {
                return Err(PolicyViolation::BadPublicKey(format!(
                    "length {}, expected {PUBLIC_KEY_LEN}",
                    key.value.len()
                ))
                .into());
            }

            match signer.mode_info.as_ref().and_then(|m| m.sum.as_ref()) {
                Some(mode_info::Sum::Single(single)) => match SignMode::try_from(single.mode) {
                    Ok(mode @ (SignMode::Unspecified | SignMode::Textual)) => {
                        return Err(PolicyViolation::BadSignatureMode(mode.name().into()).into());
                    }
                    Ok(_) => {}
                    Err(_) => {
                        return Err(PolicyViolation::BadSignatureMode(format!(
                            "unknown sign mode {}",
                            single.mode
                        ))
                        .into());
                    }
                },
                Some(mode_info::Sum::Multi(_)) => {
                    return Err(PolicyViolation::BadSignatureMode("multisig".into()).into());
                }
                None => {
                    return Err(PolicyViolation::BadSignatureMode("missing mode info".into()).into());
                }
            }
        }
        Ok(())
    }

    fn check_gas(&self, fee: Option<&Fee>) -> Result<()> {
        let gas_limit = fee.map_or(0, |f| f.gas_limit);
        if gas_limit < self.policy.minimum_gas_limit {
            return Err(PolicyViolation::GasTooLow {
                got: gas_limit,
                min: self.policy.minimum_gas_limit,
            }
            .into());
        }
        Ok(())
    }

    /// Any whitelisted message exempts the whole transaction
    fn check_fee(&self, body: &TxBody, fee: Option<&Fee>) -> Result<()> {
        if self.policy.minimum_fee.is_empty() {
            return Ok(());
        }
        if body
            .messages
            .iter()
            .any(|m| self.whitelist.contains(&m.type_url))
        {
            return Ok(());
        }

        let paid = fee.map(|f| f.amount.as_slice()).unwrap_or_default();
        for required in &self.policy.minimum_fee {
            let min = parse_amount(&required.amount)?;
            // paid coins with unreadable amounts cannot count toward the fee
            let covered = paid
                .iter()
                .filter(|c| c.denom == required.denom)
                .filter_map(|c| parse_amount(&c.amount).ok())
                .any(|amount| amount >= min);
            if covered {
                return Ok(());
            }
        }

        Err(PolicyViolation::FeeTooLow {
            required: self
                .policy
                .minimum_fee
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
        .into())
    }
}

fn check_signature_lengths(signatures: &[Vec<u8>]) -> Result<()> {
    for sig in signatures {
        if sig.len() != 64 && sig.len() != 65 {
            return Err(PolicyViolation::BadSignatureFormat(sig.len()).into());
        }
    }
    Ok(())
}
