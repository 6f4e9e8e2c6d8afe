pub mod address;
pub mod rlp;
pub mod tx;

pub use address::Address;
pub use tx::{infer_recovery_id, Eip1559Transaction, LegacyTransaction, EIP1559_TX_TYPE};
