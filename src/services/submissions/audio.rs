use actix_web::http::header::{
    self, Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use super::upload::stored_path;
use super::{SubmissionService, ensure_halaqa_teacher, load_with_task};
use crate::config::AppConfig;
use crate::errors::HifzError;
use crate::models::ErrorCode;
use crate::models::users::entities::UserRole;
use crate::services::{current_user, internal_error, not_found};

/// 音频只对提交者本人、该 halaqa 的教师和管理员开放
pub async fn handle_download(
    service: &SubmissionService,
    submission_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let (submission, task) = match load_with_task(storage.as_ref(), submission_id).await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    let is_owner = user.role == UserRole::Student && submission.student_id == user.id;
    if !is_owner
        && let Err(resp) = ensure_halaqa_teacher(storage.as_ref(), &user, task.halaqa_id).await
    {
        return Ok(resp);
    }

    let file = match storage.get_file_by_token(&submission.audio_token).await {
        Ok(Some(file)) => file,
        Ok(None) => return Ok(not_found(ErrorCode::FileNotFound, "音频不存在")),
        Err(e) => return Ok(internal_error("查询音频失败", e)),
    };

    let path = stored_path(&AppConfig::get().upload.dir, &file.stored_name);
    let bytes = match web::block(move || std::fs::read(path)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Audio {} missing on disk", file.stored_name);
            return Ok(not_found(ErrorCode::FileNotFound, "音频不存在"));
        }
        Ok(Err(e)) => return Ok(internal_error("读取音频失败", HifzError::from(e))),
        Err(e) => return Ok(internal_error("读取音频失败", e)),
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, file.content_type))
        .insert_header(inline_disposition(&file.original_name))
        .body(bytes))
}

/// 文件名可能含阿拉伯字母，使用 RFC 5987 的 filename* 形式
fn inline_disposition(original_name: &str) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Inline,
        parameters: vec![DispositionParam::FilenameExt(ExtendedValue {
            charset: Charset::Ext("UTF-8".to_string()),
            language_tag: None,
            value: original_name.as_bytes().to_vec(),
        })],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_encodes_utf8_name() {
        let value = inline_disposition("الفاتحة.ogg").to_string();
        assert!(value.starts_with("inline; filename*=UTF-8''"));
        assert!(value.ends_with(".ogg"));
    }
}
