//! 站内通知：收件箱、未读数与已读标记，均限定为当前用户

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::notifications::requests::NotificationListParams;
use crate::models::notifications::responses::{MarkAllReadResponse, UnreadCountResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

use super::{current_user, internal_error, not_found};

pub struct NotificationService {
    storage: Option<Arc<dyn Storage>>,
}

impl NotificationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    #[cfg(test)]
    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::resolve_storage(&self.storage, request)
    }

    /// 最新的在前
    pub async fn list(
        &self,
        params: NotificationListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = match current_user(request) {
            Ok(user) => user,
            Err(resp) => return Ok(resp),
        };

        match storage
            .list_notifications_with_pagination(
                user.id,
                params.pagination.page,
                params.pagination.size,
                params.unread_only,
            )
            .await
        {
            Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取通知成功"))),
            Err(e) => Ok(internal_error("获取通知失败", e)),
        }
    }

    pub async fn unread_count(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = match current_user(request) {
            Ok(user) => user,
            Err(resp) => return Ok(resp),
        };

        match storage.count_unread_notifications(user.id).await {
            Ok(unread_count) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                UnreadCountResponse { unread_count },
                "查询成功",
            ))),
            Err(e) => Ok(internal_error("查询未读通知数量失败", e)),
        }
    }

    pub async fn mark_read(
        &self,
        notification_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = match current_user(request) {
            Ok(user) => user,
            Err(resp) => return Ok(resp),
        };

        // 他人的通知同样视为不存在
        match storage.mark_notification_read(user.id, notification_id).await {
            Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("已标记为已读"))),
            Ok(false) => Ok(not_found(ErrorCode::NotificationNotFound, "通知不存在")),
            Err(e) => Ok(internal_error("标记通知失败", e)),
        }
    }

    pub async fn mark_all_read(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = match current_user(request) {
            Ok(user) => user,
            Err(resp) => return Ok(resp),
        };

        match storage.mark_all_notifications_read(user.id).await {
            Ok(count) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                MarkAllReadResponse {
                    marked_count: count as i64,
                },
                "已全部标记为已读",
            ))),
            Err(e) => Ok(internal_error("标记通知失败", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaginationQuery;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_inbox_flow() {
        let storage = Arc::new(memory_storage().await);
        let teacher = storage
            .register_user(record("ustadha", UserRole::Teacher, None))
            .await
            .unwrap();
        let a = storage
            .register_user(record("hafsa", UserRole::Student, None))
            .await
            .unwrap();
        let b = storage
            .register_user(record("ruqayya", UserRole::Student, None))
            .await
            .unwrap();
        storage
            .create_notifications(
                teacher.user.id,
                &[a.user.id, b.user.id],
                "تذكير",
                "مراجعة سورة الملك",
            )
            .await
            .unwrap();
        storage
            .create_notifications(teacher.user.id, &[a.user.id], "تنبيه", "الحلقة غدا")
            .await
            .unwrap();

        let service = NotificationService::with_storage(storage.clone());
        let req = request_as(&a.user);

        let body = body_json(service.unread_count(&req).await.unwrap()).await;
        assert_eq!(body["data"]["unread_count"], 2);

        let params = NotificationListParams {
            pagination: PaginationQuery { page: 1, size: 10 },
            unread_only: false,
        };
        let body = body_json(service.list(params, &req).await.unwrap()).await;
        let items = body["data"]["items"].as_array().cloned().unwrap_or_default();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "تنبيه");

        // 不能标记别人的通知
        let other_id = items[0]["id"].as_i64().unwrap();
        let resp = service
            .mark_read(other_id, &request_as(&b.user))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = service.mark_read(other_id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(service.mark_all_read(&req).await.unwrap()).await;
        assert_eq!(body["data"]["marked_count"], 1);

        let body = body_json(service.unread_count(&req).await.unwrap()).await;
        assert_eq!(body["data"]["unread_count"], 0);
        let body = body_json(service.unread_count(&request_as(&b.user)).await.unwrap()).await;
        assert_eq!(body["data"]["unread_count"], 1);
    }
}
