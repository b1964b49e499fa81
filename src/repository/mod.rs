//! Database repository layer
//! 所有方法都在请求事务的连接上执行

pub mod claim_repo;
pub mod dependent_repo;
pub mod item_repo;
pub mod ledger_repo;
pub mod policy_repo;
pub mod user_repo;

pub use claim_repo::*;
pub use dependent_repo::*;
pub use item_repo::*;
pub use ledger_repo::*;
pub use policy_repo::*;
pub use user_repo::*;
