//! 资源路径解析
//!
//! `/api/v1/{resource}/{id}/{sub}` 拆成资源名、可选的资源 ID 和子资源。
//! 第二段一旦出现就必须是非零 UUID，否则在访问数据库之前报 MalformedResourceId。

use uuid::Uuid;

use super::permission::SubResource;
use crate::error::AppError;

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub resource: String,
    pub id: Option<Uuid>,
    pub sub_resource: SubResource,
}

pub fn parse_resource_path(path: &str) -> Result<ResourcePath, AppError> {
    let trimmed = path.strip_prefix(API_PREFIX).unwrap_or(path);
    let mut segments = trimmed.split('/').filter(|s| !s.is_empty());

    let resource = segments
        .next()
        .ok_or_else(|| AppError::validation("request path names no resource"))?
        .to_string();

    let Some(id_segment) = segments.next() else {
        return Ok(ResourcePath {
            resource,
            id: None,
            sub_resource: SubResource::None,
        });
    };

    let id = Uuid::parse_str(id_segment)
        .ok()
        .filter(|id| !id.is_nil())
        .ok_or_else(|| AppError::MalformedResourceId(id_segment.to_string()))?;

    Ok(ResourcePath {
        resource,
        id: Some(id),
        sub_resource: segments.next().map(SubResource::parse).unwrap_or_default(),
    })
}
