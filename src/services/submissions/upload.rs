//! 音频上传：先落盘，再由调用方写库

use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::errors::HifzError;
use crate::models::files::entities::NewFileRecord;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::bad_request;
use crate::utils::{audio_content_type, validate_magic_bytes};

/// multipart 中的音频字段名
pub const AUDIO_FIELD: &str = "audio";

/// 魔术字节检查需要的头部长度
const MAGIC_HEAD_LEN: usize = 12;

pub(crate) fn stored_path(dir: &str, stored_name: &str) -> PathBuf {
    Path::new(dir).join(stored_name)
}

/// 删除磁盘上的音频，失败只记录日志
pub(crate) fn remove_stored(dir: &str, stored_name: &str) {
    let path = stored_path(dir, stored_name);
    if let Err(e) = fs::remove_file(&path) {
        tracing::warn!(
            "{}",
            HifzError::file_operation(format!("删除音频 {} 失败: {e}", path.display()))
        );
    }
}

/// 小写并带点号的扩展名，没有扩展名时为空
pub(crate) fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

fn upload_failed(message: &str, err: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("{}", HifzError::file_operation(format!("{message}: {err}")));
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::FileUploadFailed,
        message,
    ))
}

/// 读取 multipart 中唯一的 `audio` 字段并写入 `{dir}/{token}{ext}`
///
/// 出错时已写入的部分会被删除；返回的记录尚未入库。
pub async fn receive_audio(
    mut payload: Multipart,
    config: &UploadConfig,
    user_id: i64,
) -> Result<NewFileRecord, HttpResponse> {
    if let Err(e) = fs::create_dir_all(&config.dir) {
        return Err(upload_failed("创建上传目录失败", e));
    }

    let mut received: Option<NewFileRecord> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != AUDIO_FIELD {
            continue;
        }
        if let Some(previous) = &received {
            remove_stored(&config.dir, &previous.stored_name);
            return Err(bad_request(
                ErrorCode::MultifileUploadNotAllowed,
                "每次只能上传一个音频",
            ));
        }

        let original_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string())
            .unwrap_or_default();
        let extension = extension_of(&original_name);
        if !config
            .allowed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&extension))
        {
            return Err(bad_request(ErrorCode::FileTypeNotAllowed, "不支持的音频格式"));
        }

        let token = Uuid::new_v4().to_string();
        let stored_name = format!("{token}{extension}");
        let path = stored_path(&config.dir, &stored_name);
        let mut file = File::create(&path).map_err(|e| upload_failed("音频文件创建失败", e))?;

        let mut head: Vec<u8> = Vec::with_capacity(MAGIC_HEAD_LEN);
        let mut checked = false;
        let mut total_size: usize = 0;
        while let Some(chunk) = field.next().await {
            let data = match chunk {
                Ok(data) => data,
                Err(e) => {
                    remove_stored(&config.dir, &stored_name);
                    return Err(bad_request(
                        ErrorCode::FileUploadFailed,
                        format!("读取上传内容失败: {e}"),
                    ));
                }
            };

            if !checked {
                head.extend(data.iter().take(MAGIC_HEAD_LEN - head.len()));
                if head.len() >= MAGIC_HEAD_LEN {
                    checked = true;
                    if !validate_magic_bytes(&head, &extension) {
                        remove_stored(&config.dir, &stored_name);
                        return Err(bad_request(
                            ErrorCode::FileTypeNotAllowed,
                            "音频内容与扩展名不匹配",
                        ));
                    }
                }
            }

            total_size += data.len();
            if total_size > config.max_size {
                remove_stored(&config.dir, &stored_name);
                return Err(bad_request(ErrorCode::FileSizeExceeded, "音频超过大小限制"));
            }
            if let Err(e) = file.write_all(&data) {
                remove_stored(&config.dir, &stored_name);
                return Err(upload_failed("音频写入失败", e));
            }
        }

        // 文件比检查长度还短
        if !checked && (head.is_empty() || !validate_magic_bytes(&head, &extension)) {
            remove_stored(&config.dir, &stored_name);
            return Err(bad_request(ErrorCode::AudioMissing, "音频内容为空或无效"));
        }

        received = Some(NewFileRecord {
            token,
            original_name,
            stored_name,
            file_size: total_size as i64,
            content_type: audio_content_type(&extension).to_string(),
            user_id,
        });
    }

    received.ok_or_else(|| bad_request(ErrorCode::AudioMissing, "请上传音频（字段 audio）"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("tilawah.MP3"), ".mp3");
        assert_eq!(extension_of("voice.note.webm"), ".webm");
        assert_eq!(extension_of("noext"), "");
    }

    #[test]
    fn test_stored_path() {
        assert_eq!(
            stored_path("uploads/audio", "abc.ogg"),
            PathBuf::from("uploads/audio/abc.ogg")
        );
    }
}
