use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{HalaqaService, resolve_halaqa};
use crate::models::ErrorCode;
use crate::models::halaqat::responses::BroadcastResponse;
use crate::models::notifications::requests::BroadcastRequest;
use crate::models::ApiResponse;
use crate::services::{bad_request, current_user, internal_error};

/// 给 halaqa 当前的每个学生发一条通知
pub async fn broadcast(
    service: &HalaqaService,
    halaqa_id: i64,
    req: BroadcastRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let sender = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let (title, message) = match req.normalized() {
        Ok(content) => content,
        Err(msg) => return Ok(bad_request(ErrorCode::NotificationContentInvalid, msg)),
    };
    let halaqa = match resolve_halaqa(storage.as_ref(), request, halaqa_id).await {
        Ok(halaqa) => halaqa,
        Err(resp) => return Ok(resp),
    };

    let recipients: Vec<i64> = match storage.list_halaqa_students(halaqa.id).await {
        Ok(students) => students.into_iter().map(|s| s.user.id).collect(),
        Err(e) => return Ok(internal_error("查询 halaqa 学生失败", e)),
    };

    match storage
        .create_notifications(sender.id, &recipients, &title, &message)
        .await
    {
        Ok(sent) => {
            tracing::info!(
                "User {} broadcast to halaqa {} ({} recipients)",
                sender.id,
                halaqa.id,
                sent
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                BroadcastResponse {
                    sent_count: sent as i64,
                },
                "通知已发送",
            )))
        }
        Err(e) => Ok(internal_error("发送通知失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_broadcast_reaches_current_students() {
        let storage = Arc::new(memory_storage().await);
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa As-Salam".into(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let ali = storage
            .register_user(record("ali", UserRole::Student, Some(halaqa.id)))
            .await
            .unwrap();
        let umar = storage
            .register_user(record("umar", UserRole::Student, Some(halaqa.id)))
            .await
            .unwrap();
        storage.set_student_halaqa(umar.user.id, None).await.unwrap();
        let service = HalaqaService::with_storage(storage.clone());

        let resp = broadcast(
            &service,
            halaqa.id,
            BroadcastRequest {
                title: "تذكير".into(),
                message: "الحلقة بعد المغرب".into(),
            },
            &request_as(&teacher.user),
        )
        .await
        .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["sent_count"], 1);
        assert_eq!(storage.count_unread_notifications(ali.user.id).await.unwrap(), 1);
        assert_eq!(storage.count_unread_notifications(umar.user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let storage = Arc::new(memory_storage().await);
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let service = HalaqaService::with_storage(storage);
        let resp = broadcast(
            &service,
            1,
            BroadcastRequest {
                title: "x".into(),
                message: "  ".into(),
            },
            &request_as(&teacher.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
