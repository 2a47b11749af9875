pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod halaqat;
pub mod notifications;
pub mod submissions;
pub mod tasks;
pub mod users;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use halaqat::HalaqaService;
pub use notifications::NotificationService;
pub use submissions::SubmissionService;
pub use tasks::TaskService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::HifzError;
use crate::middlewares::RequireJWT;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 各 service 共用的存储获取逻辑：测试时可注入，否则从 app_data 读取
pub(crate) fn resolve_storage(
    injected: &Option<Arc<dyn Storage>>,
    request: &HttpRequest,
) -> ActixResult<Arc<dyn Storage>> {
    if let Some(storage) = injected {
        return Ok(storage.clone());
    }
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Storage not found in app data"))
}

pub(crate) fn resolve_cache(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

/// 当前登录用户，缺失时给出 401 响应
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "用户未登录",
        ))
    })
}

pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn forbidden(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

/// 内部错误只记录日志，对外返回通用消息
pub(crate) fn internal_error(context: &str, err: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("{}: {}", context, err);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        "服务器内部错误",
    ))
}

fn status_of(err: &HifzError) -> (StatusCode, ErrorCode) {
    match err {
        HifzError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
        HifzError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        HifzError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
        HifzError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::AuthFailed),
        HifzError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

/// 业务错误转响应，`code` 覆盖用户可见错误的默认错误码
pub(crate) fn error_response(err: &HifzError, code: Option<ErrorCode>) -> HttpResponse {
    if !err.is_user_facing() {
        return internal_error(err.error_type(), err.message());
    }
    let (status, default_code) = status_of(err);
    HttpResponse::build(status).json(ApiResponse::error_empty(
        code.unwrap_or(default_code),
        err.message(),
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::{HttpMessage, HttpRequest, test};

    use crate::models::users::entities::User;

    /// 带登录用户的请求
    pub fn request_as(user: &User) -> HttpRequest {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(user.clone());
        req
    }

    /// 读取响应体中的 code 与 data
    pub async fn body_json(resp: actix_web::HttpResponse) -> serde_json::Value {
        let bytes = actix_web::body::to_bytes(resp.into_body())
            .await
            .unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let resp = error_response(&HifzError::validation("hifdh 超出范围"), None);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_response(
            &HifzError::not_found("task"),
            Some(ErrorCode::TaskNotFound),
        );
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = error_response(&HifzError::conflict("dup"), None);
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = error_response(&HifzError::database_operation("boom"), None);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
