use super::entities::{Gender, TeacherStatus, UserRole, UserStatus};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub teacher_status: Option<TeacherStatus>,
    pub halaqa_id: Option<i64>,
    pub search: Option<String>,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub teacher_status: Option<TeacherStatus>,
    pub halaqa_id: Option<i64>,
    pub search: Option<String>,
}

impl From<UserListParams> for UserListQuery {
    fn from(params: UserListParams) -> Self {
        Self {
            page: Some(params.pagination.page),
            size: Some(params.pagination.size),
            role: params.role,
            status: params.status,
            teacher_status: params.teacher_status,
            halaqa_id: params.halaqa_id,
            search: params.search,
        }
    }
}

/// 注册用户记录（用于存储层，用户与资料在同一事务中创建）
#[derive(Debug, Clone)]
pub struct RegisterUserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub display_name: Option<String>,
    pub halaqa_id: Option<i64>,
    pub gender: Option<Gender>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub guardian_phone: Option<String>,
    pub institution: Option<String>,
    pub bio: Option<String>,
}

// 用户账号更新（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub status: Option<UserStatus>,
    pub display_name: Option<String>,
}

// 用户资料更新（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileFields {
    pub gender: Option<Gender>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub guardian_phone: Option<String>,
    pub institution: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdateProfileFields {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none()
            && self.birth_date.is_none()
            && self.guardian_phone.is_none()
            && self.institution.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
    }
}

// 教师审核请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateTeacherStatusRequest {
    pub teacher_status: TeacherStatus,
}

// 账号状态更新请求（停用 / 启用）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
}

// 分配学生到 halaqa
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct AssignHalaqaRequest {
    pub halaqa_id: i64,
}
