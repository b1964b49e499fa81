//! 数据模型模块
//! 保单、物品、理赔及账务模型

pub mod claim;
pub mod claim_item;
pub mod item;
pub mod ledger;
pub mod policy;
pub mod user;

pub use claim::{Claim, ClaimStatus};
pub use claim_item::{ClaimItem, ClaimItemStatus};
pub use item::{CoverageStatus, Item, ItemCategory};
pub use ledger::{LedgerEntry, LedgerEntryType, LedgerReport};
pub use policy::{Policy, PolicyDependent, PolicyUser, Strike};
pub use user::{AppRole, Capability, User};
