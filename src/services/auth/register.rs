use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::HifzError;
use crate::models::auth::requests::RegisterRequest;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::RegisterUserRecord;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response, internal_error};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{
    validate_display_name, validate_email, validate_guardian_phone, validate_password_simple,
    validate_username,
};

use super::AuthService;

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 写库前的全部格式校验，不访问数据库
pub(crate) fn validate_registration(req: &RegisterRequest) -> Result<(), HttpResponse> {
    if let Err(msg) = validate_username(&req.username) {
        return Err(bad_request(ErrorCode::UserNameInvalid, msg));
    }
    if let Err(msg) = validate_email(&req.email) {
        return Err(bad_request(ErrorCode::UserEmailInvalid, msg));
    }
    if let Err(msg) = validate_password_simple(&req.password, &req.username) {
        return Err(bad_request(ErrorCode::UserPasswordInvalid, msg));
    }
    if req.password != req.password_confirm {
        return Err(bad_request(ErrorCode::PasswordMismatch, "两次输入的密码不一致"));
    }
    if let Some(name) = &req.display_name
        && let Err(msg) = validate_display_name(name)
    {
        return Err(bad_request(ErrorCode::ValidationFailed, msg));
    }
    if let Some(phone) = req.guardian_phone.as_deref().filter(|p| !p.trim().is_empty())
        && let Err(msg) = validate_guardian_phone(phone)
    {
        return Err(bad_request(ErrorCode::ValidationFailed, msg));
    }

    match req.role {
        UserRole::Student => {
            if req.birth_date.is_none() {
                return Err(bad_request(ErrorCode::ValidationFailed, "学生必须填写出生日期"));
            }
            if req.gender.is_none() {
                return Err(bad_request(ErrorCode::ValidationFailed, "学生必须选择性别"));
            }
            if req.halaqa_id.is_none() {
                return Err(bad_request(ErrorCode::ValidationFailed, "学生必须选择 halaqa"));
            }
        }
        UserRole::Teacher => {}
        UserRole::Admin => {
            return Err(bad_request(ErrorCode::ValidationFailed, "不能注册管理员账号"));
        }
    }
    Ok(())
}

async fn check_unique(
    storage: &Arc<dyn Storage>,
    username: &str,
    email: &str,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_username(username).await {
        Ok(Some(_)) => {
            return Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserNameAlreadyExists,
                "用户名已存在",
            )));
        }
        Ok(None) => {}
        Err(e) => return Err(internal_error("注册检查用户名失败", e)),
    }
    match storage.get_user_by_email(email).await {
        Ok(Some(_)) => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserEmailAlreadyExists,
            "邮箱已被使用",
        ))),
        Ok(None) => Ok(()),
        Err(e) => Err(internal_error("注册检查邮箱失败", e)),
    }
}

pub async fn handle_register(
    service: &AuthService,
    req: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    // 1. 格式校验
    if let Err(response) = validate_registration(&req) {
        return Ok(response);
    }

    // 2. 学生所选 halaqa 必须存在
    if req.role == UserRole::Student
        && let Some(halaqa_id) = req.halaqa_id
    {
        match storage.get_halaqa_by_id(halaqa_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(bad_request(ErrorCode::HalaqaNotFound, "所选 halaqa 不存在"));
            }
            Err(e) => return Ok(internal_error("注册查询 halaqa 失败", e)),
        }
    }

    // 3. 用户名 / 邮箱唯一
    if let Err(response) = check_unique(&storage, &req.username, &req.email).await {
        return Ok(response);
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => return Ok(internal_error("密码哈希失败", e)),
    };

    // 教师的 halaqa 由管理员分配，学生的专属字段对教师无意义
    let is_student = req.role == UserRole::Student;
    let record = RegisterUserRecord {
        username: req.username,
        email: req.email.trim().to_lowercase(),
        password_hash,
        role: req.role,
        display_name: trimmed(req.display_name),
        halaqa_id: req.halaqa_id.filter(|_| is_student),
        gender: req.gender,
        birth_date: req.birth_date.filter(|_| is_student),
        guardian_phone: trimmed(req.guardian_phone).filter(|_| is_student),
        institution: trimmed(req.institution).filter(|_| !is_student),
        bio: trimmed(req.bio).filter(|_| !is_student),
    };

    // 4. 用户与资料同一事务写入，并发撞上唯一约束时整体回滚
    match storage.register_user(record).await {
        Ok(account) => {
            tracing::info!(
                "Registered {} {} (id {})",
                account.user.role,
                account.user.username,
                account.user.id
            );
            let message = if account.user.role == UserRole::Teacher {
                "注册成功，请等待管理员审核"
            } else {
                "注册成功"
            };
            Ok(HttpResponse::Created().json(ApiResponse::success(account, message)))
        }
        Err(e @ HifzError::Conflict(_)) => {
            Ok(error_response(&e, Some(ErrorCode::RegisterFailed)))
        }
        Err(e) => Ok(internal_error("注册失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::Gender;

    fn student_request() -> RegisterRequest {
        RegisterRequest {
            username: "abdullah".into(),
            email: "abdullah@example.org".into(),
            password: "Tarteel-2024".into(),
            password_confirm: "Tarteel-2024".into(),
            role: UserRole::Student,
            display_name: Some("Abdullah".into()),
            gender: Some(Gender::Male),
            birth_date: chrono::NaiveDate::from_ymd_opt(2014, 5, 1),
            guardian_phone: Some("+966501234567".into()),
            halaqa_id: Some(1),
            institution: None,
            bio: None,
        }
    }

    #[test]
    fn test_valid_student() {
        assert!(validate_registration(&student_request()).is_ok());
    }

    #[test]
    fn test_password_confirmation() {
        let mut req = student_request();
        req.password_confirm = "Tarteel-2025".into();
        assert_eq!(
            validate_registration(&req).unwrap_err().status(),
            actix_web::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_student_required_fields() {
        let mut req = student_request();
        req.birth_date = None;
        assert!(validate_registration(&req).is_err());

        let mut req = student_request();
        req.halaqa_id = None;
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_teacher_needs_no_halaqa_but_admin_refused() {
        let mut req = student_request();
        req.role = UserRole::Teacher;
        req.halaqa_id = None;
        req.birth_date = None;
        assert!(validate_registration(&req).is_ok());

        req.role = UserRole::Admin;
        assert!(validate_registration(&req).is_err());
    }
}
