//! Permission vocabulary
//! 粗粒度权限由 HTTP 方法推出，子资源是叠加在 Create/Update 上的业务动作（submit、approve 等）。
//! 两者都是封闭集合：不支持的方法为 `Denied`，未知子资源为 `Unrecognized`，任何规则都不放行

use axum::http::Method;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    List,
    View,
    Create,
    Update,
    Delete,
    Denied,
}

impl Permission {
    /// HTTP 方法映射为权限；`has_id` 区分集合 GET（List）和单个资源 GET（View）
    pub fn from_method(method: &Method, has_id: bool) -> Self {
        match *method {
            Method::GET if has_id => Permission::View,
            Method::GET => Permission::List,
            Method::POST => Permission::Create,
            Method::PUT | Method::PATCH => Permission::Update,
            Method::DELETE => Permission::Delete,
            _ => Permission::Denied,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::List => "list",
            Permission::View => "view",
            Permission::Create => "create",
            Permission::Update => "update",
            Permission::Delete => "delete",
            Permission::Denied => "denied",
        }
    }

    /// List 和 View 不改变状态
    pub fn is_read(&self) -> bool {
        matches!(self, Permission::List | Permission::View)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubResource {
    /// 基础动作本身（无子资源段）
    #[default]
    None,
    Submit,
    Revision,
    Approve,
    Deny,
    Preapprove,
    Receipt,
    Items,
    Claims,
    Dependents,
    Members,
    Strikes,
    Unrecognized,
}

impl SubResource {
    pub fn parse(segment: &str) -> Self {
        match segment {
            "" => SubResource::None,
            "submit" => SubResource::Submit,
            "revision" => SubResource::Revision,
            "approve" => SubResource::Approve,
            "deny" => SubResource::Deny,
            "preapprove" => SubResource::Preapprove,
            "receipt" => SubResource::Receipt,
            "items" => SubResource::Items,
            "claims" => SubResource::Claims,
            "dependents" => SubResource::Dependents,
            "members" => SubResource::Members,
            "strikes" => SubResource::Strikes,
            _ => SubResource::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubResource::None => "",
            SubResource::Submit => "submit",
            SubResource::Revision => "revision",
            SubResource::Approve => "approve",
            SubResource::Deny => "deny",
            SubResource::Preapprove => "preapprove",
            SubResource::Receipt => "receipt",
            SubResource::Items => "items",
            SubResource::Claims => "claims",
            SubResource::Dependents => "dependents",
            SubResource::Members => "members",
            SubResource::Strikes => "strikes",
            SubResource::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for SubResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
