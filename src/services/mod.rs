//! Business logic services layer
//! 服务方法都在请求事务的连接上执行，状态变更事件排入请求的事件队列

pub mod claim_service;
pub mod item_service;
pub mod ledger_service;
pub mod premium;

pub use claim_service::ClaimService;
pub use item_service::ItemService;
pub use ledger_service::LedgerService;
