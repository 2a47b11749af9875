//! 路径 ID 提取器：解析失败或非正数时直接返回 400

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn parse_id(req: &HttpRequest, param: &str, label: &str) -> Result<i64, actix_web::Error> {
    match req.match_info().get(param).map(str::parse::<i64>) {
        Some(Ok(id)) if id > 0 => Ok(id),
        _ => {
            let message = format!("无效的{label}");
            tracing::debug!("Rejected path parameter {}: {:?}", param, req.match_info().get(param));
            Err(actix_web::error::InternalError::from_response(
                message.clone(),
                HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
            )
            .into())
        }
    }
}

macro_rules! safe_id_extractor {
    ($name:ident, $param:literal, $label:literal) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_id(req, $param, $label).map($name))
            }
        }
    };
}

safe_id_extractor!(SafeIDI64, "id", "用户 ID");
safe_id_extractor!(SafeHalaqaIdI64, "halaqa_id", "halaqa ID");
safe_id_extractor!(SafeTaskIdI64, "task_id", "任务 ID");
safe_id_extractor!(SafeSubmissionIdI64, "submission_id", "提交 ID");
safe_id_extractor!(SafeNotificationIdI64, "notification_id", "通知 ID");
safe_id_extractor!(SafeTeacherIdI64, "teacher_id", "教师 ID");
safe_id_extractor!(SafeStudentIdI64, "student_id", "学生 ID");

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn extract(path: &str, value: &str) -> Result<i64, actix_web::Error> {
        let req = TestRequest::default()
            .param(path.to_string(), value.to_string())
            .to_http_request();
        parse_id(&req, path, "ID")
    }

    #[test]
    fn test_valid_id() {
        assert_eq!(extract("halaqa_id", "12").unwrap(), 12);
    }

    #[test]
    fn test_rejects_bad_ids() {
        assert!(extract("task_id", "abc").is_err());
        assert!(extract("task_id", "0").is_err());
        assert!(extract("task_id", "-3").is_err());
    }

    #[test]
    fn test_missing_param() {
        let req = TestRequest::default().to_http_request();
        assert!(parse_id(&req, "submission_id", "ID").is_err());
    }
}
