use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::SubmissionService;
use super::upload::{receive_audio, remove_stored};
use crate::config::AppConfig;
use crate::models::submissions::responses::{SubmitResponse, SubmitStats};
use crate::models::tasks::entities::Task;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::dashboard::student_pending_count;
use crate::services::{current_user, forbidden, internal_error, not_found};
use crate::storage::Storage;

/// 学生能否提交该任务：在任务所属 halaqa，且任务对其可见
async fn submittable_task(
    storage: &dyn Storage,
    student: &User,
    task_id: i64,
) -> Result<Task, HttpResponse> {
    let task = match storage.get_task_by_id(task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => return Err(not_found(ErrorCode::TaskNotFound, "任务不存在")),
        Err(e) => return Err(internal_error("查询任务失败", e)),
    };
    let profile = match storage.get_user_with_profile(student.id).await {
        Ok(found) => found.and_then(|account| account.profile),
        Err(e) => return Err(internal_error("查询学生资料失败", e)),
    };

    let allowed = profile.is_some_and(|p| {
        p.halaqa_id == Some(task.halaqa_id) && task.visible_to(student.id, p.halaqa_joined_at)
    });
    if !allowed {
        return Err(forbidden(
            ErrorCode::SubmissionPermissionDenied,
            "无权提交该任务",
        ));
    }
    Ok(task)
}

pub async fn handle_submit(
    service: &SubmissionService,
    task_id: i64,
    payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let student = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 权限检查在读取上传内容之前
    if let Err(resp) = submittable_task(storage.as_ref(), &student, task_id).await {
        return Ok(resp);
    }

    let upload = &AppConfig::get().upload;
    let file = match receive_audio(payload, upload, student.id).await {
        Ok(file) => file,
        Err(resp) => return Ok(resp),
    };
    let stored_name = file.stored_name.clone();

    let written = match storage.upsert_submission(task_id, student.id, file).await {
        Ok(written) => written,
        Err(e) => {
            // 事务失败时刚写入的文件没有任何引用
            remove_stored(&upload.dir, &stored_name);
            return Ok(internal_error("保存提交失败", e));
        }
    };
    if let Some(orphan) = &written.orphaned_file {
        remove_stored(&upload.dir, orphan);
    }

    let pending_tasks_count = match student_pending_count(storage.as_ref(), student.id, Utc::now()).await {
        Ok(count) => count,
        Err(e) => return Ok(internal_error("统计待完成任务失败", e)),
    };

    tracing::info!(
        "Student {} submitted task {} (submission {})",
        student.id,
        task_id,
        written.submission.id
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SubmitResponse {
            submission: written.submission,
            new_stats: SubmitStats {
                pending_tasks_count,
            },
        },
        "提交成功",
    )))
}

/// 删除本人的提交，任务回到待完成
pub async fn handle_retry(
    service: &SubmissionService,
    task_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let student = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.delete_submission(task_id, student.id).await {
        Ok(Some(removal)) => {
            if let Some(orphan) = &removal.orphaned_file {
                remove_stored(&AppConfig::get().upload.dir, orphan);
            }
            tracing::info!(
                "Student {} retried task {} (submission {} removed)",
                student.id,
                task_id,
                removal.submission_id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("提交已撤回，可以重新提交")))
        }
        Ok(None) => Ok(not_found(ErrorCode::SubmissionNotFound, "提交不存在")),
        Err(e) => Ok(internal_error("撤回提交失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::tasks::entities::TaskKind;
    use crate::models::tasks::requests::NewTaskRecord;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::request_as;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_student_of_other_halaqa_denied() {
        let storage = Arc::new(memory_storage().await);
        storage.seed_surahs().await.unwrap();
        let mut ids = Vec::new();
        for name in ["Halaqa Al-Bayan", "Halaqa At-Tibyan"] {
            let h = storage
                .create_halaqa(CreateHalaqaRequest {
                    name: name.into(),
                    juz_from: None,
                    juz_to: None,
                    description: None,
                })
                .await
                .unwrap();
            ids.push(h.id);
        }
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let outsider = storage
            .register_user(record("ibrahim", UserRole::Student, Some(ids[1])))
            .await
            .unwrap();
        let task = storage
            .create_task(NewTaskRecord {
                halaqa_id: ids[0],
                created_by: teacher.user.id,
                kind: TaskKind::Recitation,
                surah_id: 108,
                start_ayah: 1,
                end_ayah: 3,
                deadline: None,
                student_id: None,
            })
            .await
            .unwrap();

        let denied = submittable_task(storage.as_ref(), &outsider.user, task.id)
            .await
            .unwrap_err();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let missing = submittable_task(storage.as_ref(), &outsider.user, 4242)
            .await
            .unwrap_err();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_retry_without_submission() {
        let storage = Arc::new(memory_storage().await);
        let student = storage
            .register_user(record("hasan", UserRole::Student, None))
            .await
            .unwrap();
        let service = SubmissionService::with_storage(storage);
        let resp = handle_retry(&service, 1, &request_as(&student.user))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
