use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, ensure_halaqa_teacher, load_with_task};
use crate::models::submissions::entities::SubmissionStatus;
use crate::models::submissions::requests::{
    GradeRequest, SubmissionListParams, SubmissionListQuery,
};
use crate::models::submissions::responses::{GradeResponse, SubmissionDetail};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::dashboard::load_teacher_scope;
use crate::services::{bad_request, current_user, forbidden, internal_error, not_found};

/// 教师负责的 halaqa 内的提交，默认只看待评分的
pub async fn list_submissions(
    service: &SubmissionService,
    params: SubmissionListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let teacher = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let halaqat = if teacher.role == UserRole::Admin {
        storage.list_halaqat().await
    } else {
        storage.list_teacher_halaqat(teacher.id).await
    };
    let mut halaqa_ids: Vec<i64> = match halaqat {
        Ok(halaqat) => halaqat.into_iter().map(|h| h.id).collect(),
        Err(e) => return Ok(internal_error("查询教师 halaqa 失败", e)),
    };
    if let Some(only) = params.halaqa_id {
        if !halaqa_ids.contains(&only) {
            return Ok(forbidden(
                ErrorCode::HalaqaPermissionDenied,
                "您不是该 halaqa 的教师",
            ));
        }
        halaqa_ids = vec![only];
    }

    let query = SubmissionListQuery {
        page: params.pagination.page,
        size: params.pagination.size,
        status: Some(params.status.unwrap_or(SubmissionStatus::Submitted)),
        kind: params.kind,
        halaqa_ids,
    };
    match storage.list_submissions_with_pagination(query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取提交列表成功"))),
        Err(e) => Ok(internal_error("获取提交列表失败", e)),
    }
}

pub async fn get_detail(
    service: &SubmissionService,
    submission_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let teacher = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let (submission, task) = match load_with_task(storage.as_ref(), submission_id).await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = ensure_halaqa_teacher(storage.as_ref(), &teacher, task.halaqa_id).await {
        return Ok(resp);
    }

    let surah_name = match storage.get_surah_by_id(task.surah_id).await {
        Ok(surah) => surah.map(|s| s.name).unwrap_or_default(),
        Err(e) => return Ok(internal_error("查询 surah 失败", e)),
    };
    let student = match storage.get_user_with_profile(submission.student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "学生不存在")),
        Err(e) => return Ok(internal_error("查询学生失败", e)),
    };

    let detail = SubmissionDetail {
        id: submission.id,
        task_id: task.id,
        student_id: student.user.id,
        student_name: student.user.name().to_string(),
        avatar_url: student.profile.as_ref().and_then(|p| p.avatar()),
        task_title: task.title(&surah_name),
        kind: task.kind,
        deadline: task.deadline,
        submitted_at: submission.updated_at,
        audio_url: submission.audio_url(),
        notes: submission.notes,
        hifdh: submission.hifdh,
        rules: submission.rules,
        score: submission.score,
        status: submission.status,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(detail, "获取提交详情成功")))
}

/// 评分：分数校验先于任何写入，返回最新的教师统计
pub async fn grade(
    service: &SubmissionService,
    submission_id: i64,
    grade: GradeRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let teacher = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let (_, task) = match load_with_task(storage.as_ref(), submission_id).await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = ensure_halaqa_teacher(storage.as_ref(), &teacher, task.halaqa_id).await {
        return Ok(resp);
    }

    let record = match grade.into_record(teacher.id) {
        Ok(record) => record,
        Err(msg) => return Ok(bad_request(ErrorCode::GradeOutOfRange, msg)),
    };

    let submission = match storage.grade_submission(submission_id, record).await {
        Ok(Some(submission)) => submission,
        Ok(None) => return Ok(not_found(ErrorCode::SubmissionNotFound, "提交不存在")),
        Err(e) => return Ok(internal_error("评分失败", e)),
    };
    tracing::info!(
        "Submission {} graded {:?} by {}",
        submission.id,
        submission.score,
        teacher.id
    );

    match load_teacher_scope(storage.as_ref(), &teacher).await {
        Ok(scope) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            GradeResponse {
                submission,
                stats: scope.stats(),
            },
            "评分成功",
        ))),
        Err(e) => Ok(internal_error("统计教师数据失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::files::entities::NewFileRecord;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::tasks::entities::TaskKind;
    use crate::models::tasks::requests::NewTaskRecord;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use crate::models::users::responses::UserWithProfile;
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    struct Graded {
        storage: Arc<crate::storage::sea_orm_storage::SeaOrmStorage>,
        teacher: UserWithProfile,
        outsider: UserWithProfile,
        submission_id: i64,
    }

    async fn submitted() -> Graded {
        let storage = Arc::new(memory_storage().await);
        storage.seed_surahs().await.unwrap();
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Al-Baqarah".into(),
                juz_from: Some(1),
                juz_to: Some(3),
                description: None,
            })
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let outsider = storage
            .register_user(record("visitor", UserRole::Teacher, None))
            .await
            .unwrap();
        storage.add_halaqa_teacher(halaqa.id, teacher.user.id).await.unwrap();
        let student = storage
            .register_user(record("saad", UserRole::Student, Some(halaqa.id)))
            .await
            .unwrap();
        let task = storage
            .create_task(NewTaskRecord {
                halaqa_id: halaqa.id,
                created_by: teacher.user.id,
                kind: TaskKind::Recitation,
                surah_id: 2,
                start_ayah: 1,
                end_ayah: 5,
                deadline: None,
                student_id: None,
            })
            .await
            .unwrap();
        let written = storage
            .upsert_submission(
                task.id,
                student.user.id,
                NewFileRecord {
                    token: "tok".into(),
                    original_name: "baqarah.ogg".into(),
                    stored_name: "tok.ogg".into(),
                    file_size: 10,
                    content_type: "audio/ogg".into(),
                    user_id: student.user.id,
                },
            )
            .await
            .unwrap();

        Graded {
            storage,
            teacher,
            outsider,
            submission_id: written.submission.id,
        }
    }

    #[tokio::test]
    async fn test_grade_computes_score_and_stats() {
        let g = submitted().await;
        let service = SubmissionService::with_storage(g.storage.clone());

        let resp = grade(
            &service,
            g.submission_id,
            GradeRequest {
                hifdh: 4.0,
                rules: 3.0,
                notes: Some("راجع المدود".into()),
            },
            &request_as(&g.teacher.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["submission"]["score"], 7.0);
        assert_eq!(body["data"]["submission"]["status"], "graded");
        assert_eq!(body["data"]["stats"]["pending_submissions_count"], 0);
        assert_eq!(body["data"]["stats"]["average_performance"], 70.0);
    }

    #[tokio::test]
    async fn test_out_of_range_leaves_submission_unchanged() {
        let g = submitted().await;
        let service = SubmissionService::with_storage(g.storage.clone());

        let resp = grade(
            &service,
            g.submission_id,
            GradeRequest {
                hifdh: 6.0,
                rules: 3.0,
                notes: None,
            },
            &request_as(&g.teacher.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let stored = g
            .storage
            .get_submission_by_id(g.submission_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Submitted);
        assert!(stored.score.is_none());
    }

    #[tokio::test]
    async fn test_other_teacher_cannot_grade_or_view() {
        let g = submitted().await;
        let service = SubmissionService::with_storage(g.storage.clone());
        let req = request_as(&g.outsider.user);

        let resp = grade(
            &service,
            g.submission_id,
            GradeRequest {
                hifdh: 5.0,
                rules: 5.0,
                notes: None,
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = get_detail(&service, g.submission_id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_detail_title() {
        let g = submitted().await;
        let service = SubmissionService::with_storage(g.storage.clone());
        let resp = get_detail(&service, g.submission_id, &request_as(&g.teacher.user))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["task_title"], "البقرة 1-5");
        assert_eq!(body["data"]["student_name"], "saad");
        assert_eq!(
            body["data"]["audio_url"],
            format!("/api/v1/submissions/{}/audio", g.submission_id)
        );
    }
}
