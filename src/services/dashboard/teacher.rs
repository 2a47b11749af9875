use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{DashboardService, aggregate, load_teacher_scope};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::dashboard::responses::TeacherDashboardResponse;
use crate::models::submissions::entities::SubmissionStatus;
use crate::models::submissions::requests::SubmissionListQuery;
use crate::models::users::entities::User;
use crate::services::{current_user, internal_error};
use crate::storage::Storage;

/// 首页展示的最近待评提交数
const RECENT_SUBMISSIONS: i64 = 5;

pub(crate) async fn build_teacher_dashboard(
    storage: &dyn Storage,
    teacher: &User,
) -> Result<TeacherDashboardResponse> {
    let scope = load_teacher_scope(storage, teacher).await?;
    let stats = scope.stats();

    let recent = storage
        .list_submissions_with_pagination(SubmissionListQuery {
            page: 1,
            size: RECENT_SUBMISSIONS,
            status: Some(SubmissionStatus::Submitted),
            kind: None,
            halaqa_ids: scope.halaqa_ids(),
        })
        .await?;

    let halaqat = scope
        .halaqat
        .iter()
        .map(|h| {
            let count = scope.student_counts.get(&h.id).copied().unwrap_or(0);
            aggregate::halaqa_summary(h.clone(), count, &scope.tasks, &scope.submissions)
        })
        .collect();

    Ok(TeacherDashboardResponse {
        stats,
        halaqat,
        recent_submissions: recent.items,
    })
}

pub async fn handle_teacher_dashboard(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let teacher = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match build_teacher_dashboard(storage.as_ref(), &teacher).await {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            dashboard,
            "获取教师首页成功",
        ))),
        Err(e) => Ok(internal_error("获取教师首页失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::files::entities::NewFileRecord;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::tasks::entities::TaskKind;
    use crate::models::tasks::requests::NewTaskRecord;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};

    #[tokio::test]
    async fn test_teacher_sees_only_own_halaqat() {
        let storage = memory_storage().await;
        storage.seed_surahs().await.unwrap();
        let own = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Al-Huda".into(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Ar-Rahma".into(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadha", UserRole::Teacher, None))
            .await
            .unwrap();
        storage.add_halaqa_teacher(own.id, teacher.user.id).await.unwrap();
        let student = storage
            .register_user(record("maryam", UserRole::Student, Some(own.id)))
            .await
            .unwrap();
        let task = storage
            .create_task(NewTaskRecord {
                halaqa_id: own.id,
                created_by: teacher.user.id,
                kind: TaskKind::Review,
                surah_id: 1,
                start_ayah: 1,
                end_ayah: 7,
                deadline: None,
                student_id: None,
            })
            .await
            .unwrap();
        storage
            .upsert_submission(
                task.id,
                student.user.id,
                NewFileRecord {
                    token: "t1".into(),
                    original_name: "fatiha.m4a".into(),
                    stored_name: "t1.m4a".into(),
                    file_size: 100,
                    content_type: "audio/mp4".into(),
                    user_id: student.user.id,
                },
            )
            .await
            .unwrap();

        let dashboard = build_teacher_dashboard(&storage, &teacher.user)
            .await
            .unwrap();
        assert_eq!(dashboard.stats.halaqa_count, 1);
        assert_eq!(dashboard.stats.student_count, 1);
        assert_eq!(dashboard.stats.pending_submissions_count, 1);
        assert_eq!(dashboard.halaqat[0].last_review_at, Some(task.created_at));
        assert_eq!(dashboard.recent_submissions.len(), 1);
    }
}
