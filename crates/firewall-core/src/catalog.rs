//! Built-in route tables for known Cosmos applications
//!
//! Each application serves the Tendermint RPC surface plus the gRPC services,
//! message types and REST gateway routes of the modules it wires in.

/// Tendermint / CometBFT JSON-RPC routes
pub(crate) const TENDERMINT_RPC: &[&str] = &[
    "/",
    "/health",
    "/status",
    "/net_info",
    "/blockchain",
    "/genesis",
    "/genesis_chunked",
    "/block",
    "/block_by_hash",
    "/block_results",
    "/block_search",
    "/commit",
    "/check_tx",
    "/tx",
    "/tx_search",
    "/validators",
    "/dump_consensus_state",
    "/consensus_state",
    "/consensus_params",
    "/unconfirmed_txs",
    "/num_unconfirmed_txs",
    "/broadcast_tx_sync",
    "/broadcast_tx_async",
    "/broadcast_tx_commit",
    "/broadcast_evidence",
    "/abci_query",
    "/abci_info",
    "/subscribe",
    "/unsubscribe",
    "/unsubscribe_all",
];

/// Cosmos SDK gRPC query and service methods
pub(crate) const SDK_GRPC_METHODS: &[&str] = &[
    "/cosmos.tx.v1beta1.Service/Simulate",
    "/cosmos.tx.v1beta1.Service/GetTx",
    "/cosmos.tx.v1beta1.Service/BroadcastTx",
    "/cosmos.tx.v1beta1.Service/GetTxsEvent",
    "/cosmos.tx.v1beta1.Service/GetBlockWithTxs",
    "/cosmos.base.tendermint.v1beta1.Service/GetNodeInfo",
    "/cosmos.base.tendermint.v1beta1.Service/GetSyncing",
    "/cosmos.base.tendermint.v1beta1.Service/GetLatestBlock",
    "/cosmos.base.tendermint.v1beta1.Service/GetBlockByHeight",
    "/cosmos.base.tendermint.v1beta1.Service/GetLatestValidatorSet",
    "/cosmos.base.tendermint.v1beta1.Service/GetValidatorSetByHeight",
    "/cosmos.base.tendermint.v1beta1.Service/ABCIQuery",
    "/cosmos.base.node.v1beta1.Service/Config",
    "/cosmos.base.reflection.v1beta1.ReflectionService/ListAllInterfaces",
    "/cosmos.base.reflection.v1beta1.ReflectionService/ListImplementations",
    "/cosmos.auth.v1beta1.Query/Accounts",
    "/cosmos.auth.v1beta1.Query/Account",
    "/cosmos.auth.v1beta1.Query/Params",
    "/cosmos.auth.v1beta1.Query/ModuleAccounts",
    "/cosmos.auth.v1beta1.Query/Bech32Prefix",
    "/cosmos.bank.v1beta1.Query/Balance",
    "/cosmos.bank.v1beta1.Query/AllBalances",
    "/cosmos.bank.v1beta1.Query/SpendableBalances",
    "/cosmos.bank.v1beta1.Query/TotalSupply",
    "/cosmos.bank.v1beta1.Query/SupplyOf",
    "/cosmos.bank.v1beta1.Query/Params",
    "/cosmos.bank.v1beta1.Query/DenomMetadata",
    "/cosmos.bank.v1beta1.Query/DenomsMetadata",
    "/cosmos.bank.v1beta1.Query/DenomOwners",
    "/cosmos.staking.v1beta1.Query/Validators",
    "/cosmos.staking.v1beta1.Query/Validator",
    "/cosmos.staking.v1beta1.Query/ValidatorDelegations",
    "/cosmos.staking.v1beta1.Query/ValidatorUnbondingDelegations",
    "/cosmos.staking.v1beta1.Query/Delegation",
    "/cosmos.staking.v1beta1.Query/UnbondingDelegation",
    "/cosmos.staking.v1beta1.Query/DelegatorDelegations",
    "/cosmos.staking.v1beta1.Query/DelegatorUnbondingDelegations",
    "/cosmos.staking.v1beta1.Query/Redelegations",
    "/cosmos.staking.v1beta1.Query/DelegatorValidators",
    "/cosmos.staking.v1beta1.Query/DelegatorValidator",
    "/cosmos.staking.v1beta1.Query/HistoricalInfo",
    "/cosmos.staking.v1beta1.Query/Pool",
    "/cosmos.staking.v1beta1.Query/Params",
    "/cosmos.distribution.v1beta1.Query/Params",
    "/cosmos.distribution.v1beta1.Query/ValidatorOutstandingRewards",
    "/cosmos.distribution.v1beta1.Query/ValidatorCommission",
    "/cosmos.distribution.v1beta1.Query/ValidatorSlashes",
    "/cosmos.distribution.v1beta1.Query/DelegationRewards",
    "/cosmos.distribution.v1beta1.Query/DelegationTotalRewards",
    "/cosmos.distribution.v1beta1.Query/DelegatorValidators",
    "/cosmos.distribution.v1beta1.Query/DelegatorWithdrawAddress",
    "/cosmos.distribution.v1beta1.Query/CommunityPool",
    "/cosmos.gov.v1beta1.Query/Proposal",
    "/cosmos.gov.v1beta1.Query/Proposals",
    "/cosmos.gov.v1beta1.Query/Vote",
    "/cosmos.gov.v1beta1.Query/Votes",
    "/cosmos.gov.v1beta1.Query/Params",
    "/cosmos.gov.v1beta1.Query/Deposit",
    "/cosmos.gov.v1beta1.Query/Deposits",
    "/cosmos.gov.v1beta1.Query/TallyResult",
    "/cosmos.slashing.v1beta1.Query/Params",
    "/cosmos.slashing.v1beta1.Query/SigningInfo",
    "/cosmos.slashing.v1beta1.Query/SigningInfos",
    "/cosmos.mint.v1beta1.Query/Params",
    "/cosmos.mint.v1beta1.Query/Inflation",
    "/cosmos.mint.v1beta1.Query/AnnualProvisions",
    "/cosmos.upgrade.v1beta1.Query/CurrentPlan",
    "/cosmos.upgrade.v1beta1.Query/AppliedPlan",
    "/cosmos.upgrade.v1beta1.Query/ModuleVersions",
    "/cosmos.feegrant.v1beta1.Query/Allowance",
    "/cosmos.feegrant.v1beta1.Query/Allowances",
    "/cosmos.authz.v1beta1.Query/Grants",
    "/cosmos.evidence.v1beta1.Query/Evidence",
    "/cosmos.evidence.v1beta1.Query/AllEvidence",
    "/cosmos.params.v1beta1.Query/Params",
    "/ibc.applications.transfer.v1.Query/DenomTrace",
    "/ibc.applications.transfer.v1.Query/DenomTraces",
    "/ibc.applications.transfer.v1.Query/Params",
    "/ibc.core.client.v1.Query/ClientState",
    "/ibc.core.client.v1.Query/ClientStates",
    "/ibc.core.channel.v1.Query/Channel",
    "/ibc.core.channel.v1.Query/Channels",
    "/ibc.core.connection.v1.Query/Connection",
    "/ibc.core.connection.v1.Query/Connections",
];

/// Cosmos SDK message type URLs accepted inside transactions
pub(crate) const SDK_MSG_TYPES: &[&str] = &[
    "/cosmos.bank.v1beta1.MsgSend",
    "/cosmos.bank.v1beta1.MsgMultiSend",
    "/cosmos.staking.v1beta1.MsgCreateValidator",
    "/cosmos.staking.v1beta1.MsgEditValidator",
    "/cosmos.staking.v1beta1.MsgDelegate",
    "/cosmos.staking.v1beta1.MsgBeginRedelegate",
    "/cosmos.staking.v1beta1.MsgUndelegate",
    "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress",
    "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward",
    "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission",
    "/cosmos.distribution.v1beta1.MsgFundCommunityPool",
    "/cosmos.gov.v1beta1.MsgSubmitProposal",
    "/cosmos.gov.v1beta1.MsgVote",
    "/cosmos.gov.v1beta1.MsgVoteWeighted",
    "/cosmos.gov.v1beta1.MsgDeposit",
    "/cosmos.slashing.v1beta1.MsgUnjail",
    "/cosmos.authz.v1beta1.MsgGrant",
    "/cosmos.authz.v1beta1.MsgExec",
    "/cosmos.authz.v1beta1.MsgRevoke",
    "/cosmos.feegrant.v1beta1.MsgGrantAllowance",
    "/cosmos.feegrant.v1beta1.MsgRevokeAllowance",
    "/cosmos.vesting.v1beta1.MsgCreateVestingAccount",
    "/ibc.applications.transfer.v1.MsgTransfer",
];

/// Cosmos SDK REST gateway templates and legacy routes
pub(crate) const SDK_REST_TEMPLATES: &[&str] = &[
    "/node_info",
    "/syncing",
    "/blocks/latest",
    "/blocks/{height}",
    "/validatorsets/latest",
    "/validatorsets/{height}",
    "/txs",
    "/txs/{hash}",
    "/txs/encode",
    "/txs/decode",
    "/auth/accounts/{address}",
    "/bank/balances/{address}",
    "/cosmos/tx/v1beta1/simulate",
    "/cosmos/tx/v1beta1/txs",
    "/cosmos/tx/v1beta1/txs/{hash}",
    "/cosmos/tx/v1beta1/txs/block/{height}",
    "/cosmos/base/tendermint/v1beta1/node_info",
    "/cosmos/base/tendermint/v1beta1/syncing",
    "/cosmos/base/tendermint/v1beta1/blocks/latest",
    "/cosmos/base/tendermint/v1beta1/blocks/{height}",
    "/cosmos/base/tendermint/v1beta1/validatorsets/latest",
    "/cosmos/base/tendermint/v1beta1/validatorsets/{height}",
    "/cosmos/base/node/v1beta1/config",
    "/cosmos/auth/v1beta1/accounts",
    "/cosmos/auth/v1beta1/accounts/{address}",
    "/cosmos/auth/v1beta1/params",
    "/cosmos/auth/v1beta1/module_accounts",
    "/cosmos/auth/v1beta1/bech32",
    "/cosmos/bank/v1beta1/balances/{address}",
    "/cosmos/bank/v1beta1/balances/{address}/by_denom",
    "/cosmos/bank/v1beta1/spendable_balances/{address}",
    "/cosmos/bank/v1beta1/supply",
    "/cosmos/bank/v1beta1/supply/{denom}",
    "/cosmos/bank/v1beta1/params",
    "/cosmos/bank/v1beta1/denoms_metadata",
    "/cosmos/bank/v1beta1/denoms_metadata/{denom=*}",
    "/cosmos/bank/v1beta1/denom_owners/{denom}",
    "/cosmos/staking/v1beta1/validators",
    "/cosmos/staking/v1beta1/validators/{validator_addr}",
    "/cosmos/staking/v1beta1/validators/{validator_addr}/delegations",
    "/cosmos/staking/v1beta1/validators/{validator_addr}/delegations/{delegator_addr}",
    "/cosmos/staking/v1beta1/validators/{validator_addr}/delegations/{delegator_addr}/unbonding_delegation",
    "/cosmos/staking/v1beta1/validators/{validator_addr}/unbonding_delegations",
    "/cosmos/staking/v1beta1/delegations/{delegator_addr}",
    "/cosmos/staking/v1beta1/delegators/{delegator_addr}/redelegations",
    "/cosmos/staking/v1beta1/delegators/{delegator_addr}/unbonding_delegations",
    "/cosmos/staking/v1beta1/delegators/{delegator_addr}/validators",
    "/cosmos/staking/v1beta1/delegators/{delegator_addr}/validators/{validator_addr}",
    "/cosmos/staking/v1beta1/historical_info/{height}",
    "/cosmos/staking/v1beta1/pool",
    "/cosmos/staking/v1beta1/params",
    "/cosmos/distribution/v1beta1/params",
    "/cosmos/distribution/v1beta1/validators/{validator_address}/outstanding_rewards",
    "/cosmos/distribution/v1beta1/validators/{validator_address}/commission",
    "/cosmos/distribution/v1beta1/validators/{validator_address}/slashes",
    "/cosmos/distribution/v1beta1/delegators/{delegator_address}/rewards",
    "/cosmos/distribution/v1beta1/delegators/{delegator_address}/rewards/{validator_address}",
    "/cosmos/distribution/v1beta1/delegators/{delegator_address}/validators",
    "/cosmos/distribution/v1beta1/delegators/{delegator_address}/withdraw_address",
    "/cosmos/distribution/v1beta1/community_pool",
    "/cosmos/gov/v1beta1/proposals",
    "/cosmos/gov/v1beta1/proposals/{proposal_id}",
    "/cosmos/gov/v1beta1/proposals/{proposal_id}/votes",
    "/cosmos/gov/v1beta1/proposals/{proposal_id}/votes/{voter}",
    "/cosmos/gov/v1beta1/proposals/{proposal_id}/deposits",
    "/cosmos/gov/v1beta1/proposals/{proposal_id}/deposits/{depositor}",
    "/cosmos/gov/v1beta1/proposals/{proposal_id}/tally",
    "/cosmos/gov/v1beta1/params/{params_type}",
    "/cosmos/slashing/v1beta1/params",
    "/cosmos/slashing/v1beta1/signing_infos",
    "/cosmos/slashing/v1beta1/signing_infos/{cons_address}",
    "/cosmos/mint/v1beta1/params",
    "/cosmos/mint/v1beta1/inflation",
    "/cosmos/mint/v1beta1/annual_provisions",
    "/cosmos/upgrade/v1beta1/current_plan",
    "/cosmos/upgrade/v1beta1/applied_plan/{name}",
    "/cosmos/upgrade/v1beta1/module_versions",
    "/cosmos/feegrant/v1beta1/allowance/{granter}/{grantee}",
    "/cosmos/feegrant/v1beta1/allowances/{grantee}",
    "/cosmos/authz/v1beta1/grants",
    "/cosmos/evidence/v1beta1/evidence",
    "/cosmos/evidence/v1beta1/evidence/{evidence_hash}",
    "/cosmos/params/v1beta1/params",
    "/ibc/apps/transfer/v1/params",
    "/ibc/apps/transfer/v1/denom_traces",
    "/ibc/apps/transfer/v1/denom_traces/{hash=**}",
    "/ibc/core/client/v1/client_states",
    "/ibc/core/client/v1/client_states/{client_id}",
    "/ibc/core/channel/v1/channels",
    "/ibc/core/channel/v1/channels/{channel_id}/ports/{port_id}",
    "/ibc/core/connection/v1/connections",
    "/ibc/core/connection/v1/connections/{connection_id}",
];

/// Ethermint EVM and fee market gRPC methods
pub(crate) const ETHERMINT_GRPC_METHODS: &[&str] = &[
    "/ethermint.evm.v1.Query/Account",
    "/ethermint.evm.v1.Query/CosmosAccount",
    "/ethermint.evm.v1.Query/ValidatorAccount",
    "/ethermint.evm.v1.Query/Balance",
    "/ethermint.evm.v1.Query/Storage",
    "/ethermint.evm.v1.Query/Code",
    "/ethermint.evm.v1.Query/Params",
    "/ethermint.evm.v1.Query/EthCall",
    "/ethermint.evm.v1.Query/EstimateGas",
    "/ethermint.evm.v1.Query/TraceTx",
    "/ethermint.evm.v1.Query/TraceBlock",
    "/ethermint.evm.v1.Query/BaseFee",
    "/ethermint.feemarket.v1.Query/Params",
    "/ethermint.feemarket.v1.Query/BaseFee",
    "/ethermint.feemarket.v1.Query/BlockGas",
];

pub(crate) const ETHERMINT_MSG_TYPES: &[&str] = &[
    "/ethermint.evm.v1.MsgEthereumTx",
    "/ethermint.evm.v1.MsgUpdateParams",
];

pub(crate) const ETHERMINT_REST_TEMPLATES: &[&str] = &[
    "/ethermint/evm/v1/account/{address}",
    "/ethermint/evm/v1/cosmos_account/{address}",
    "/ethermint/evm/v1/validator_account/{cons_address}",
    "/ethermint/evm/v1/balances/{address}",
    "/ethermint/evm/v1/storage/{address}/{key}",
    "/ethermint/evm/v1/codes/{address}",
    "/ethermint/evm/v1/params",
    "/ethermint/evm/v1/eth_call",
    "/ethermint/evm/v1/estimate_gas",
    "/ethermint/evm/v1/trace_tx",
    "/ethermint/evm/v1/trace_block",
    "/ethermint/evm/v1/base_fee",
    "/ethermint/feemarket/v1/params",
    "/ethermint/feemarket/v1/base_fee",
    "/ethermint/feemarket/v1/block_gas",
];

/// f(x)Core cross-chain and gravity modules
pub(crate) const FXCORE_GRPC_METHODS: &[&str] = &[
    "/fx.gravity.crosschain.v1.Query/Params",
    "/fx.gravity.crosschain.v1.Query/CurrentOracleSet",
    "/fx.gravity.crosschain.v1.Query/OracleSetRequest",
    "/fx.gravity.crosschain.v1.Query/LastPendingBatchRequestByAddr",
    "/fx.gravity.crosschain.v1.Query/OutgoingTxBatches",
    "/fx.gravity.crosschain.v1.Query/BatchFees",
    "/fx.gravity.crosschain.v1.Query/GetOracleByAddr",
    "/fx.gravity.crosschain.v1.Query/Oracles",
    "/fx.gravity.crosschain.v1.Query/TokenToDenom",
    "/fx.gravity.crosschain.v1.Query/DenomToToken",
    "/fx.erc20.v1.Query/TokenPairs",
    "/fx.erc20.v1.Query/TokenPair",
    "/fx.erc20.v1.Query/Params",
    "/fx.other.Query/GasPrice",
];

pub(crate) const FXCORE_MSG_TYPES: &[&str] = &[
    "/fx.gravity.crosschain.v1.MsgSendToExternal",
    "/fx.gravity.crosschain.v1.MsgCancelSendToExternal",
    "/fx.gravity.crosschain.v1.MsgRequestBatch",
    "/fx.gravity.crosschain.v1.MsgBondedOracle",
    "/fx.gravity.crosschain.v1.MsgAddDelegate",
    "/fx.gravity.crosschain.v1.MsgOracleSetConfirm",
    "/fx.gravity.crosschain.v1.MsgConfirmBatch",
    "/fx.erc20.v1.MsgConvertCoin",
    "/fx.erc20.v1.MsgConvertERC20",
    "/fx.erc20.v1.MsgConvertDenom",
];

pub(crate) const FXCORE_REST_TEMPLATES: &[&str] = &[
    "/fx/crosschain/v1/params",
    "/fx/crosschain/v1/oracle_set/current",
    "/fx/crosschain/v1/oracle_set/request",
    "/fx/crosschain/v1/oracles",
    "/fx/crosschain/v1/oracle/by_addr",
    "/fx/crosschain/v1/batch/outgoing_tx",
    "/fx/crosschain/v1/batch_fees",
    "/fx/erc20/v1/token_pairs",
    "/fx/erc20/v1/token_pairs/{token}",
    "/fx/erc20/v1/params",
    "/other/v1/gas_price",
];
