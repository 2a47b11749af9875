use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::users::entities::{TeacherStatus, User, UserRole, UserStatus};
use crate::models::users::responses::UserWithProfile;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::services::internal_error;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

use super::AuthService;

/// 登录被拒绝的原因，按检查顺序排列
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoginDenied {
    RoleMismatch,
    UnderReview,
    Rejected,
    Disabled,
}

impl LoginDenied {
    fn response(&self) -> HttpResponse {
        let (code, message) = match self {
            LoginDenied::RoleMismatch => (ErrorCode::RoleMismatch, "所选身份与账号不符"),
            LoginDenied::UnderReview => (ErrorCode::AccountUnderReview, "教师账号正在审核中"),
            LoginDenied::Rejected => (ErrorCode::AccountRejected, "教师账号审核未通过"),
            LoginDenied::Disabled => (ErrorCode::AccountDisabled, "账号已停用"),
        };
        HttpResponse::Forbidden().json(ApiResponse::error_empty(code, message))
    }
}

/// 密码正确之后的账号状态检查
pub(crate) fn check_account(
    account: &UserWithProfile,
    expected_role: Option<UserRole>,
) -> Result<(), LoginDenied> {
    if expected_role.is_some_and(|role| role != account.user.role) {
        return Err(LoginDenied::RoleMismatch);
    }
    if account.user.role == UserRole::Teacher {
        match account.profile.as_ref().map(|p| p.teacher_status) {
            Some(TeacherStatus::Pending) => return Err(LoginDenied::UnderReview),
            Some(TeacherStatus::Rejected) => return Err(LoginDenied::Rejected),
            _ => {}
        }
    }
    if account.user.status != UserStatus::Active {
        return Err(LoginDenied::Disabled);
    }
    Ok(())
}

fn auth_failed() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::AuthFailed,
        "用户名或密码错误",
    ))
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let config = service.get_config();

    // 1. 按用户名或邮箱查找
    let user: User = match storage
        .get_user_by_username_or_email(login_request.username.trim())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(auth_failed()),
        Err(e) => return Ok(internal_error("登录查询用户失败", e)),
    };

    // 2. 校验密码
    if !verify_password(&login_request.password, &user.password_hash) {
        return Ok(auth_failed());
    }

    // 3. 账号状态
    let account = match storage.get_user_with_profile(user.id).await {
        Ok(Some(account)) => account,
        Ok(None) => return Ok(auth_failed()),
        Err(e) => return Ok(internal_error("登录查询资料失败", e)),
    };
    if let Err(denied) = check_account(&account, login_request.role) {
        tracing::info!("Login denied for {}: {:?}", user.username, denied);
        return Ok(denied.response());
    }

    // 4. 签发 token
    let refresh_ttl = if login_request.remember_me {
        chrono::Duration::days(config.jwt.refresh_token_remember_me_expiry)
    } else {
        chrono::Duration::days(config.jwt.refresh_token_expiry)
    };
    let token_pair = match user.generate_token_pair(Some(refresh_ttl)) {
        Ok(pair) => pair,
        Err(e) => return Ok(internal_error("生成 token 失败", e)),
    };

    if let Err(e) = storage.update_last_login(user.id).await {
        tracing::warn!("Failed to update last login for {}: {}", user.id, e);
    }
    tracing::info!("User {} logged in successfully", user.username);

    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: JwtUtils::access_token_ttl_secs(),
        user: account.user,
        profile: account.profile,
        created_at: chrono::Utc::now(),
    };

    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_refresh_token_cookie(
            &token_pair.refresh_token,
            refresh_ttl,
        ))
        .json(ApiResponse::success(response, "登录成功")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_account_checks_in_order() {
        let storage = memory_storage().await;
        let student = storage
            .register_user(record("student01", UserRole::Student, None))
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("teacher01", UserRole::Teacher, None))
            .await
            .unwrap();

        assert_eq!(check_account(&student, None), Ok(()));
        assert_eq!(
            check_account(&student, Some(UserRole::Teacher)),
            Err(LoginDenied::RoleMismatch)
        );
        // 新注册教师待审核
        assert_eq!(
            check_account(&teacher, Some(UserRole::Teacher)),
            Err(LoginDenied::UnderReview)
        );

        let rejected = storage
            .set_teacher_status(teacher.user.id, TeacherStatus::Rejected)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(check_account(&rejected, None), Err(LoginDenied::Rejected));

        let approved = storage
            .set_teacher_status(teacher.user.id, TeacherStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(check_account(&approved, Some(UserRole::Teacher)), Ok(()));
    }
}
