use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserRole {
    Student, // 学生
    Teacher, // 教师
    Admin,   // 管理员
}

impl_string_enum!(UserRole, "用户角色", {
    Student => "student",
    Teacher => "teacher",
    Admin => "admin",
});

impl UserRole {
    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }
    pub fn teacher_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher, &Self::Admin]
    }
    pub fn student_roles() -> &'static [&'static UserRole] {
        &[&Self::Student]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Student, &Self::Teacher, &Self::Admin]
    }
}

// 用户状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserStatus {
    Active,    // 活跃
    Inactive,  // 未激活（待审核或被拒绝的教师）
    Suspended, // 停用
}

impl_string_enum!(UserStatus, "用户状态", {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
});

// 教师审核状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum TeacherStatus {
    Pending,
    Approved,
    Rejected,
}

impl_string_enum!(TeacherStatus, "教师审核状态", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl TeacherStatus {
    /// 新注册用户的初始审核状态：只有教师需要审核
    pub fn initial_for(role: UserRole) -> Self {
        match role {
            UserRole::Teacher => TeacherStatus::Pending,
            _ => TeacherStatus::Approved,
        }
    }

    /// 审核状态对应的账号状态
    pub fn account_status(&self) -> UserStatus {
        match self {
            TeacherStatus::Approved => UserStatus::Active,
            TeacherStatus::Pending | TeacherStatus::Rejected => UserStatus::Inactive,
        }
    }
}

// 性别
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum Gender {
    Male,
    Female,
}

impl_string_enum!(Gender, "性别", {
    Male => "male",
    Female => "female",
});

impl Gender {
    /// 未上传头像时使用的默认头像
    pub fn default_avatar(&self) -> &'static str {
        match self {
            Gender::Male => "/static/avatars/male.png",
            Gender::Female => "/static/avatars/female.png",
        }
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub display_name: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// 显示名称，未设置时回退到用户名
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }

    // 生成 token 对（access + refresh）
    pub fn generate_token_pair(
        &self,
        refresh_token_expiry: Option<chrono::TimeDelta>,
    ) -> Result<crate::utils::jwt::TokenPair, String> {
        crate::utils::jwt::JwtUtils::generate_token_pair(self.id, self.role, refresh_token_expiry)
        .map_err(|e| format!("生成 token 对失败: {e}"))
    }
}

// 用户资料（与用户一对一）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct Profile {
    pub user_id: i64,
    pub role: UserRole,
    pub halaqa_id: Option<i64>,
    pub halaqa_joined_at: Option<chrono::DateTime<chrono::Utc>>,
    pub teacher_status: TeacherStatus,
    pub gender: Option<Gender>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub guardian_phone: Option<String>,
    pub institution: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Profile {
    /// 头像地址，未设置时按性别给默认头像
    pub fn avatar(&self) -> Option<String> {
        self.avatar_url
            .clone()
            .or_else(|| self.gender.map(|g| g.default_avatar().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("teacher".parse::<UserRole>(), Ok(UserRole::Teacher));
        assert!("user".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Student.to_string(), "student");
    }

    #[test]
    fn test_role_deserialize_message() {
        let err = serde_json::from_str::<UserRole>("\"guest\"").unwrap_err();
        assert!(err.to_string().contains("student, teacher, admin"));
    }

    #[test]
    fn test_teacher_status_initial() {
        assert_eq!(
            TeacherStatus::initial_for(UserRole::Teacher),
            TeacherStatus::Pending
        );
        // 非教师始终为 approved
        assert_eq!(
            TeacherStatus::initial_for(UserRole::Student),
            TeacherStatus::Approved
        );
        assert_eq!(
            TeacherStatus::initial_for(UserRole::Admin),
            TeacherStatus::Approved
        );
    }

    #[test]
    fn test_account_status_follows_review() {
        assert_eq!(TeacherStatus::Approved.account_status(), UserStatus::Active);
        assert_eq!(TeacherStatus::Pending.account_status(), UserStatus::Inactive);
        assert_eq!(
            TeacherStatus::Rejected.account_status(),
            UserStatus::Inactive
        );
    }
}
