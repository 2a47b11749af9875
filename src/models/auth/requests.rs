use serde::Deserialize;
use ts_rs::TS;

use crate::models::users::entities::{Gender, UserRole};

// 用户登录请求（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct LoginRequest {
    /// 用户名或邮箱
    pub username: String,
    /// 密码
    pub password: String,
    /// 登录页选择的身份，提供时必须与账号角色一致
    #[serde(default)]
    pub role: Option<UserRole>,
    /// 是否记住我
    #[serde(default)]
    pub remember_me: bool,
}

// 用户注册请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    /// 只能注册为 student 或 teacher
    pub role: UserRole,
    pub display_name: Option<String>,
    pub gender: Option<Gender>,
    /// 学生必填
    pub birth_date: Option<chrono::NaiveDate>,
    pub guardian_phone: Option<String>,
    /// 学生必填
    pub halaqa_id: Option<i64>,
    pub institution: Option<String>,
    pub bio: Option<String>,
}

// 个人设置更新请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub guardian_phone: Option<String>,
    pub institution: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}
