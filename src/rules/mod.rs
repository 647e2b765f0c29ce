//! Rule documents and the directory inventory that produces them

mod inventory;
mod types;

pub use inventory::{InventoryError, RuleInventory};
pub use types::{compute_hash, RuleDocument, RuleId, RuleType, UsageKind, UsagePattern};
