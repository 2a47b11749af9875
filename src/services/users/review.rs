use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::users::entities::UserStatus;
use crate::models::users::requests::{UpdateTeacherStatusRequest, UpdateUserStatusRequest};
use crate::models::users::requests::UpdateUserRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, current_user, error_response, internal_error, not_found, resolve_cache,
};

async fn forget(request: &HttpRequest, user_id: i64) {
    if let Some(cache) = resolve_cache(request) {
        RequireJWT::forget_user(cache.as_ref(), user_id).await;
    }
}

/// 审核状态与账号状态一起更新：approved 启用账号，其余状态停用
pub async fn update_teacher_status(
    service: &UserService,
    user_id: i64,
    update: UpdateTeacherStatusRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage
        .set_teacher_status(user_id, update.teacher_status)
        .await
    {
        Ok(Some(account)) => {
            forget(request, user_id).await;
            tracing::info!(
                "Teacher {} review status set to {}",
                user_id,
                update.teacher_status
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(account, "审核状态已更新")))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(&e, Some(ErrorCode::TeacherStatusInvalid))),
    }
}

pub async fn update_user_status(
    service: &UserService,
    user_id: i64,
    update: UpdateUserStatusRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let admin = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 管理员不能停用自己
    if admin.id == user_id && update.status != UserStatus::Active {
        return Ok(bad_request(ErrorCode::UserUpdateFailed, "不能停用自己的账号"));
    }

    let change = UpdateUserRequest {
        status: Some(update.status),
        ..Default::default()
    };
    match storage.update_user(user_id, change).await {
        Ok(Some(user)) => {
            forget(request, user_id).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(user, "账号状态已更新")))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(internal_error("更新账号状态失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{TeacherStatus, UserRole};
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_approve_then_reject_teacher() {
        let storage = Arc::new(memory_storage().await);
        let admin = storage
            .register_user(record("admin", UserRole::Admin, None))
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadha", UserRole::Teacher, None))
            .await
            .unwrap();
        let service = UserService::with_storage(storage.clone());
        let req = request_as(&admin.user);

        let resp = update_teacher_status(
            &service,
            teacher.user.id,
            UpdateTeacherStatusRequest {
                teacher_status: TeacherStatus::Approved,
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["user"]["status"], "active");
        assert_eq!(body["data"]["profile"]["teacher_status"], "approved");

        update_teacher_status(
            &service,
            teacher.user.id,
            UpdateTeacherStatusRequest {
                teacher_status: TeacherStatus::Rejected,
            },
            &req,
        )
        .await
        .unwrap();
        let stored = storage.get_user_by_id(teacher.user.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UserStatus::Inactive);
    }

    #[tokio::test]
    async fn test_student_review_status_fixed() {
        let storage = Arc::new(memory_storage().await);
        let admin = storage
            .register_user(record("admin", UserRole::Admin, None))
            .await
            .unwrap();
        let student = storage
            .register_user(record("bilal", UserRole::Student, None))
            .await
            .unwrap();
        let service = UserService::with_storage(storage);

        let resp = update_teacher_status(
            &service,
            student.user.id,
            UpdateTeacherStatusRequest {
                teacher_status: TeacherStatus::Pending,
            },
            &request_as(&admin.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_cannot_suspend_self() {
        let storage = Arc::new(memory_storage().await);
        let admin = storage
            .register_user(record("admin", UserRole::Admin, None))
            .await
            .unwrap();
        let service = UserService::with_storage(storage);

        let resp = update_user_status(
            &service,
            admin.user.id,
            UpdateUserStatusRequest {
                status: UserStatus::Suspended,
            },
            &request_as(&admin.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
