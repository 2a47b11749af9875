use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::AssignHalaqaRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, internal_error, not_found, resolve_cache};

/// 把学生分配到 halaqa，并重置加入时间
pub async fn assign_halaqa(
    service: &UserService,
    user_id: i64,
    assign: AssignHalaqaRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.role == UserRole::Student => {}
        Ok(Some(_)) => {
            return Ok(bad_request(
                ErrorCode::ValidationFailed,
                "只能为学生分配 halaqa",
            ));
        }
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(internal_error("查询用户失败", e)),
    }

    match storage.get_halaqa_by_id(assign.halaqa_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found(ErrorCode::HalaqaNotFound, "halaqa 不存在")),
        Err(e) => return Ok(internal_error("查询 halaqa 失败", e)),
    }

    if let Err(e) = storage
        .set_student_halaqa(user_id, Some(assign.halaqa_id))
        .await
    {
        return Ok(internal_error("分配 halaqa 失败", e));
    }
    if let Some(cache) = resolve_cache(request) {
        RequireJWT::forget_user(cache.as_ref(), user_id).await;
    }

    match storage.get_user_with_profile(user_id).await {
        Ok(Some(account)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            account,
            "已分配到 halaqa",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(internal_error("查询用户失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_assign_sets_joined_at() {
        let storage = Arc::new(memory_storage().await);
        let admin = storage
            .register_user(record("admin", UserRole::Admin, None))
            .await
            .unwrap();
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Al-Fajr".into(),
                juz_from: Some(29),
                juz_to: Some(30),
                description: None,
            })
            .await
            .unwrap();
        let student = storage
            .register_user(record("khadija", UserRole::Student, None))
            .await
            .unwrap();
        let service = UserService::with_storage(storage);

        let resp = assign_halaqa(
            &service,
            student.user.id,
            AssignHalaqaRequest {
                halaqa_id: halaqa.id,
            },
            &request_as(&admin.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["profile"]["halaqa_id"], halaqa.id);
        assert!(!body["data"]["profile"]["halaqa_joined_at"].is_null());
    }

    #[tokio::test]
    async fn test_assign_teacher_refused() {
        let storage = Arc::new(memory_storage().await);
        let admin = storage
            .register_user(record("admin", UserRole::Admin, None))
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let service = UserService::with_storage(storage);

        let resp = assign_halaqa(
            &service,
            teacher.user.id,
            AssignHalaqaRequest { halaqa_id: 1 },
            &request_as(&admin.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
