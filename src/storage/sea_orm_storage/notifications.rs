//! 通知存储操作

use super::SeaOrmStorage;
use crate::entity::notifications::{ActiveModel, Column, Entity as Notifications};
use crate::errors::{HifzError, Result};
use crate::models::{PaginationInfo, notifications::responses::NotificationListResponse};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 批量创建通知，返回创建数量
    pub async fn create_notifications_impl(
        &self,
        sender_id: i64,
        recipient_ids: &[i64],
        title: &str,
        message: &str,
    ) -> Result<u64> {
        if recipient_ids.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp();
        let models: Vec<ActiveModel> = recipient_ids
            .iter()
            .map(|&recipient_id| ActiveModel {
                recipient_id: Set(recipient_id),
                sender_id: Set(Some(sender_id)),
                title: Set(title.to_string()),
                message: Set(message.to_string()),
                is_read: Set(false),
                created_at: Set(now),
                ..Default::default()
            })
            .collect();

        Notifications::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("创建通知失败: {e}")))?;

        Ok(recipient_ids.len() as u64)
    }

    /// 分页列出用户的通知，新的在前
    pub async fn list_notifications_with_pagination_impl(
        &self,
        user_id: i64,
        page: i64,
        size: i64,
        unread_only: bool,
    ) -> Result<NotificationListResponse> {
        let page = page.max(1) as u64;
        let size = size.clamp(1, 100) as u64;

        let mut select = Notifications::find().filter(Column::RecipientId.eq(user_id));
        if unread_only {
            select = select.filter(Column::IsRead.eq(false));
        }
        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| HifzError::database_operation(format!("查询通知总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| HifzError::database_operation(format!("查询通知页数失败: {e}")))?;

        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询通知列表失败: {e}")))?;

        Ok(NotificationListResponse {
            items: items.into_iter().map(|m| m.into_notification()).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 未读数量
    pub async fn count_unread_notifications_impl(&self, user_id: i64) -> Result<i64> {
        let count = Notifications::find()
            .filter(Column::RecipientId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .count(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("统计未读通知失败: {e}")))?;

        Ok(count as i64)
    }

    /// 标记单条已读，只能操作自己的通知
    pub async fn mark_notification_read_impl(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<bool> {
        let result = Notifications::update_many()
            .col_expr(Column::IsRead, sea_orm::sea_query::Expr::value(true))
            .filter(Column::Id.eq(notification_id))
            .filter(Column::RecipientId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("标记通知已读失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 全部标记已读
    pub async fn mark_all_notifications_read_impl(&self, user_id: i64) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(Column::IsRead, sea_orm::sea_query::Expr::value(true))
            .filter(Column::RecipientId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("标记全部已读失败: {e}")))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, record};
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_broadcast_and_read() {
        let storage = memory_storage().await;
        let teacher = storage
            .register_user_impl(record("umar", UserRole::Teacher, None))
            .await
            .unwrap();
        let ali = storage
            .register_user_impl(record("ali", UserRole::Student, None))
            .await
            .unwrap();
        let omar = storage
            .register_user_impl(record("omar", UserRole::Student, None))
            .await
            .unwrap();

        let sent = storage
            .create_notifications_impl(
                teacher.user.id,
                &[ali.user.id, omar.user.id],
                "تنبيه",
                "الحلقة غدا",
            )
            .await
            .unwrap();
        assert_eq!(sent, 2);
        assert_eq!(
            storage
                .count_unread_notifications_impl(ali.user.id)
                .await
                .unwrap(),
            1
        );

        let inbox = storage
            .list_notifications_with_pagination_impl(ali.user.id, 1, 10, true)
            .await
            .unwrap();
        let id = inbox.items[0].id;

        // 不能标记别人的通知
        assert!(
            !storage
                .mark_notification_read_impl(omar.user.id, id)
                .await
                .unwrap()
        );
        assert!(
            storage
                .mark_notification_read_impl(ali.user.id, id)
                .await
                .unwrap()
        );
        assert_eq!(
            storage
                .count_unread_notifications_impl(ali.user.id)
                .await
                .unwrap(),
            0
        );

        assert_eq!(
            storage
                .mark_all_notifications_read_impl(omar.user.id)
                .await
                .unwrap(),
            1
        );
    }
}
