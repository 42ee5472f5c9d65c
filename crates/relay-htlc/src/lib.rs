pub mod adapter;
pub mod collaborators;
pub mod memo;
pub mod precondition;
pub mod types;

pub use adapter::{ChainAdapter, CosmosHtlcAdapter, EvmHtlcAdapter, tx_outcome_to_event};
pub use collaborators::{AdapterFuture, Querier, TxSubmitter};
pub use memo::IbcMemo;
pub use precondition::{check_refund, check_withdraw};
pub use types::{AdapterKind, CreateHtlcRequest, HtlcRecord, TxOutcome};
