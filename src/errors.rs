//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_hifz_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum HifzError {
            $($variant(String),)*
        }

        impl HifzError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(HifzError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(HifzError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(HifzError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl HifzError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        HifzError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_hifz_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    Conflict("E010", "Integrity Conflict"),
    DateParse("E011", "Date Parse Error"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
}

impl HifzError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否可以把消息原样返回给调用方
    ///
    /// 数据库、文件、序列化等内部错误只记录日志，不对外暴露细节。
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            HifzError::Validation(_)
                | HifzError::NotFound(_)
                | HifzError::Conflict(_)
                | HifzError::Authentication(_)
                | HifzError::Authorization(_)
        )
    }

    /// 将数据库错误转换为业务错误，唯一约束冲突单独识别
    pub fn from_db(err: sea_orm::DbErr, context: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
                HifzError::Conflict(format!("{context}: {detail}"))
            }
            _ => HifzError::DatabaseOperation(format!("{context}: {err}")),
        }
    }
}

impl fmt::Display for HifzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for HifzError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for HifzError {
    fn from(err: sea_orm::DbErr) -> Self {
        HifzError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for HifzError {
    fn from(err: std::io::Error) -> Self {
        HifzError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for HifzError {
    fn from(err: serde_json::Error) -> Self {
        HifzError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for HifzError {
    fn from(err: chrono::ParseError) -> Self {
        HifzError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HifzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(HifzError::cache_connection("test").code(), "E001");
        assert_eq!(HifzError::database_config("test").code(), "E003");
        assert_eq!(HifzError::validation("test").code(), "E007");
        assert_eq!(HifzError::conflict("test").code(), "E010");
        assert_eq!(HifzError::authentication("test").code(), "E012");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            HifzError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(HifzError::validation("test").error_type(), "Validation Error");
    }

    #[test]
    fn test_error_message() {
        let err = HifzError::validation("start_ayah 不能大于 end_ayah");
        assert_eq!(err.message(), "start_ayah 不能大于 end_ayah");
    }

    #[test]
    fn test_user_facing() {
        assert!(HifzError::validation("x").is_user_facing());
        assert!(HifzError::authorization("x").is_user_facing());
        assert!(!HifzError::database_operation("x").is_user_facing());
        assert!(!HifzError::file_operation("x").is_user_facing());
    }

    #[test]
    fn test_db_error_mapping() {
        let err = HifzError::from_db(sea_orm::DbErr::Custom("boom".into()), "创建提交失败");
        assert_eq!(err.code(), "E005");
        assert!(err.message().starts_with("创建提交失败"));
    }
}
