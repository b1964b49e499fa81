//! User repository (数据库访问层)
//! 用户由单点登录同步创建，本服务只读取和修改资料

use crate::{error::AppError, models::user::*};
use sqlx::PgConnection;
use uuid::Uuid;

pub struct UserRepository;

impl UserRepository {
    /// 根据 ID 查找用户
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(user)
    }

    /// 列出用户（分页）
    pub async fn list(conn: &mut PgConnection, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY last_name, first_name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(users)
    }

    /// 更新用户；`app_role` 为 None 时保持不变
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        req: &UpdateUserRequest,
        app_role: Option<AppRole>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                app_role = COALESCE($4, app_role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(app_role)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("user {}", id)))?;

        Ok(user)
    }
}
