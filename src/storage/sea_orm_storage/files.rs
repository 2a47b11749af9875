//! 文件存储操作
//!
//! 音频文件以引用计数管理：提交引用时加一，替换或重做时释放，归零即删除记录。

use super::SeaOrmStorage;
use crate::entity::files::{ActiveModel, Column, Entity as Files};
use crate::errors::{HifzError, Result};
use crate::models::files::entities::{File, NewFileRecord};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

/// 写入新文件记录，初始引用计数为 1
pub(super) async fn insert_cited_file<C: ConnectionTrait>(
    conn: &C,
    file: NewFileRecord,
) -> Result<File> {
    let model = ActiveModel {
        token: Set(file.token),
        original_name: Set(file.original_name),
        stored_name: Set(file.stored_name),
        file_size: Set(file.file_size),
        content_type: Set(file.content_type),
        citation_count: Set(1),
        user_id: Set(file.user_id),
        uploaded_at: Set(chrono::Utc::now().timestamp()),
    };

    let result = model
        .insert(conn)
        .await
        .map_err(|e| HifzError::from_db(e, "保存文件记录失败"))?;

    Ok(result.into_file())
}

/// 释放一次引用；计数归零时删除记录并返回磁盘文件名
pub(super) async fn release_file<C: ConnectionTrait>(
    conn: &C,
    token: &str,
) -> Result<Option<String>> {
    let Some(file) = Files::find_by_id(token.to_string())
        .one(conn)
        .await
        .map_err(|e| HifzError::database_operation(format!("查询文件失败: {e}")))?
    else {
        return Ok(None);
    };

    if file.citation_count > 1 {
        Files::update_many()
            .col_expr(
                Column::CitationCount,
                sea_orm::sea_query::Expr::value(file.citation_count - 1),
            )
            .filter(Column::Token.eq(token))
            .exec(conn)
            .await
            .map_err(|e| HifzError::database_operation(format!("更新文件引用失败: {e}")))?;
        return Ok(None);
    }

    Files::delete_by_id(token.to_string())
        .exec(conn)
        .await
        .map_err(|e| HifzError::database_operation(format!("删除文件记录失败: {e}")))?;

    Ok(Some(file.stored_name))
}

impl SeaOrmStorage {
    /// 通过 token 获取文件信息
    pub async fn get_file_by_token_impl(&self, token: &str) -> Result<Option<File>> {
        let result = Files::find_by_id(token.to_string())
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询文件失败: {e}")))?;

        Ok(result.map(|m| m.into_file()))
    }
}
