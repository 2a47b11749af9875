use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireJWT;
use crate::models::auth::requests::UpdateProfileRequest;
use crate::models::auth::responses::UserInfoResponse;
use crate::models::users::requests::{UpdateProfileFields, UpdateUserRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, internal_error, not_found, resolve_cache};
use crate::utils::password::hash_password;
use crate::utils::validate::{
    validate_display_name, validate_email, validate_guardian_phone, validate_password_simple,
};

use super::AuthService;

/// 空白字符串视为未提供
fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn handle_update_profile(
    service: &AuthService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let display_name = provided(update_data.display_name);
    if let Some(name) = &display_name
        && let Err(msg) = validate_display_name(name)
    {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }

    let guardian_phone = provided(update_data.guardian_phone);
    if let Some(phone) = &guardian_phone
        && let Err(msg) = validate_guardian_phone(phone)
    {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }

    // 新邮箱需要格式正确且未被其他用户使用
    let email = provided(update_data.email).map(|e| e.to_lowercase());
    if let Some(email) = &email {
        if let Err(msg) = validate_email(email) {
            return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
        }
        match storage.get_user_by_email(email).await {
            Ok(Some(existing)) if existing.id != current.id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserEmailAlreadyExists,
                    "该邮箱已被使用",
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(internal_error("检查邮箱失败", e)),
        }
    }

    let password_hash = match update_data.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            if let Err(msg) = validate_password_simple(&password, &current.username) {
                return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
            }
            match hash_password(&password) {
                Ok(hash) => Some(hash),
                Err(e) => return Ok(internal_error("密码哈希失败", e)),
            }
        }
        None => None,
    };

    // 角色和账号状态不允许自助修改
    let account_update = UpdateUserRequest {
        email,
        password: password_hash,
        status: None,
        display_name,
    };
    let user = match storage.update_user(current.id, account_update).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => {
            tracing::warn!("Update user {} failed: {}", current.id, e);
            return Ok(bad_request(ErrorCode::UserUpdateFailed, "更新用户信息失败"));
        }
    };

    let fields = UpdateProfileFields {
        gender: update_data.gender,
        birth_date: update_data.birth_date,
        guardian_phone,
        institution: provided(update_data.institution),
        bio: provided(update_data.bio),
        avatar_url: provided(update_data.avatar_url),
    };
    let profile = if fields.is_empty() {
        storage
            .get_user_with_profile(current.id)
            .await
            .map(|found| found.and_then(|account| account.profile))
    } else {
        storage.update_profile(current.id, fields).await
    };
    let profile = match profile {
        Ok(profile) => profile,
        Err(e) => return Ok(internal_error("更新用户资料失败", e)),
    };

    if let Some(cache) = resolve_cache(request) {
        RequireJWT::forget_user(cache.as_ref(), current.id).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserInfoResponse { user, profile },
        "用户信息更新成功",
    )))
}
