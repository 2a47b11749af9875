//! 业务数据模型
//!
//! 每个领域拆分为 entities（业务实体）、requests（请求参数）、responses（响应体）。

/// 为以字符串持久化的枚举生成 as_str / Display / FromStr / Deserialize
///
/// Serialize 由 `#[serde(rename_all = "snake_case")]` 派生，值需与此处的字符串一致。
macro_rules! impl_string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $value:literal),* $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)*
                    _ => Err(format!("Invalid {}: {s}", $label)),
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse::<$name>().map_err(|_| {
                    serde::de::Error::custom(format!(
                        "无效的{}: '{s}'. 支持: {}",
                        $label,
                        [$($value),*].join(", ")
                    ))
                })
            }
        }
    };
}

pub mod attendance;
pub mod auth;
pub mod common;
pub mod dashboard;
pub mod files;
pub mod halaqat;
pub mod notifications;
pub mod submissions;
pub mod surahs;
pub mod tasks;
pub mod users;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// API 响应错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    // 认证
    AuthFailed = 2000,
    RoleMismatch = 2001,
    AccountUnderReview = 2002,
    AccountRejected = 2003,
    AccountDisabled = 2004,
    RegisterFailed = 2010,
    PasswordMismatch = 2011,

    // 用户
    UserNotFound = 3000,
    UserNameInvalid = 3001,
    UserEmailInvalid = 3002,
    UserPasswordInvalid = 3003,
    UserNameAlreadyExists = 3004,
    UserEmailAlreadyExists = 3005,
    UserUpdateFailed = 3006,
    TeacherStatusInvalid = 3007,

    // halaqa
    HalaqaNotFound = 4000,
    HalaqaPermissionDenied = 4001,
    HalaqaNameAlreadyExists = 4002,
    HalaqaJuzRangeInvalid = 4003,
    StudentNotInHalaqa = 4004,

    // 任务
    TaskNotFound = 5000,
    SurahNotFound = 5001,
    AyahRangeInvalid = 5002,
    TaskPermissionDenied = 5003,

    // 提交与评分
    SubmissionNotFound = 6000,
    GradeOutOfRange = 6001,
    SubmissionPermissionDenied = 6002,

    // 文件
    FileNotFound = 7000,
    FileUploadFailed = 7001,
    FileTypeNotAllowed = 7002,
    FileSizeExceeded = 7003,
    AudioMissing = 7004,
    MultifileUploadNotAllowed = 7005,

    // 通知
    NotificationNotFound = 8000,
    NotificationContentInvalid = 8001,
}
