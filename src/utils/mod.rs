pub mod extractor;
pub mod file_magic;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod quran;
pub mod sql;
pub mod validate;

pub use extractor::{
    SafeHalaqaIdI64, SafeIDI64, SafeNotificationIdI64, SafeStudentIdI64, SafeSubmissionIdI64,
    SafeTaskIdI64, SafeTeacherIdI64,
};
pub use file_magic::{audio_content_type, validate_magic_bytes};
pub use parameter_error_handler::{json_error_handler, path_error_handler, query_error_handler};
pub use sql::escape_like_pattern;
