//! 资源级授权
//! 路径解析、权限词汇、Authable 能力与授权分发中间件

pub mod authable;
pub mod dispatcher;
pub mod ownership;
pub mod path;
pub mod permission;
pub mod registry;
pub mod resources;

pub use authable::{Authable, RequestMeta};
pub use dispatcher::authorize;
pub use path::{parse_resource_path, ResourcePath};
pub use permission::{Permission, SubResource};
pub use registry::{Decision, ResourceKind, ResourceRegistry};
