use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, NaiveDate, Utc};

use super::{DashboardService, aggregate, load_student_views};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::dashboard::responses::StudentDashboardResponse;
use crate::models::users::responses::UserWithProfile;
use crate::models::{ApiResponse, ErrorCode};
use crate::policy::WEEK_WINDOW_DAYS;
use crate::services::{current_user, internal_error, not_found};
use crate::storage::Storage;

/// 组装学生首页，`today` 为应用时区的日期
pub(crate) async fn build_student_dashboard(
    storage: &dyn Storage,
    student: UserWithProfile,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<StudentDashboardResponse> {
    // 当天首次访问记为出勤
    let (_, created) = storage.ensure_attendance(student.user.id, today).await?;
    if created {
        tracing::debug!("Attendance recorded for student {} on {}", student.user.id, today);
    }

    let halaqa = match student.profile.as_ref().and_then(|p| p.halaqa_id) {
        Some(id) => storage.get_halaqa_by_id(id).await?,
        None => None,
    };
    let views = load_student_views(storage, &student, now).await?;
    let attendance = storage
        .list_attendance(
            student.user.id,
            today - chrono::Duration::days(WEEK_WINDOW_DAYS - 1),
            today,
        )
        .await?;
    let unread_notifications = storage.count_unread_notifications(student.user.id).await?;

    // 成绩统计覆盖全部提交，换 halaqa 不丢记录
    let submissions = storage.list_student_submissions(student.user.id).await?;
    let task_ids: Vec<i64> = submissions.iter().map(|s| s.task_id).collect();
    let tasks = storage.list_tasks_by_ids(&task_ids).await?;
    let history = aggregate::pair_history(tasks, submissions);

    let stats = aggregate::student_stats(&views, &history, &attendance, today, now);
    let (pending_tasks, completed_tasks, awaiting_tasks) = aggregate::partition_tasks(views);

    Ok(StudentDashboardResponse {
        halaqa,
        stats,
        pending_tasks,
        completed_tasks,
        awaiting_tasks,
        weekly_attendance: aggregate::weekly_slots(&attendance, today),
        unread_notifications,
    })
}

pub async fn handle_student_dashboard(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let student = match storage.get_user_with_profile(user.id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(internal_error("查询学生失败", e)),
    };

    let now = Utc::now();
    match build_student_dashboard(storage.as_ref(), student, AppConfig::get().today(), now).await
    {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            dashboard,
            "获取学生首页成功",
        ))),
        Err(e) => Ok(internal_error("获取学生首页失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::files::entities::NewFileRecord;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::submissions::requests::GradeRequest;
    use crate::models::tasks::entities::TaskKind;
    use crate::models::tasks::requests::NewTaskRecord;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};

    struct Circle {
        storage: SeaOrmStorage,
        teacher_id: i64,
        student_id: i64,
        task_id: i64,
    }

    fn audio(token: &str, user_id: i64) -> NewFileRecord {
        NewFileRecord {
            token: token.to_string(),
            original_name: "tilawah.mp3".to_string(),
            stored_name: format!("{token}.mp3"),
            file_size: 2048,
            content_type: "audio/mpeg".to_string(),
            user_id,
        }
    }

    /// 一个 halaqa、一名教师、一名学生，以及 Al-Baqarah 1-5 的背诵任务
    async fn circle() -> Circle {
        let storage = memory_storage().await;
        storage.seed_surahs().await.unwrap();
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa An-Nur".into(),
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
        storage
            .add_halaqa_teacher(halaqa.id, teacher.user.id)
            .await
            .unwrap();
        let student = storage
            .register_user(record("yusuf", UserRole::Student, Some(halaqa.id)))
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

        Circle {
            storage,
            teacher_id: teacher.user.id,
            student_id: student.user.id,
            task_id: task.id,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    async fn dashboard(c: &Circle) -> StudentDashboardResponse {
        let student = c
            .storage
            .get_user_with_profile(c.student_id)
            .await
            .unwrap()
            .unwrap();
        build_student_dashboard(&c.storage, student, today(), Utc::now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_then_grade_updates_stats() {
        let c = circle().await;

        let before = dashboard(&c).await;
        assert_eq!(before.stats.pending_tasks_count, 1);
        assert_eq!(before.pending_tasks[0].title, "البقرة 1-5");

        let written = c
            .storage
            .upsert_submission(c.task_id, c.student_id, audio("a1", c.student_id))
            .await
            .unwrap();
        let submitted = dashboard(&c).await;
        assert_eq!(submitted.stats.pending_tasks_count, 0);
        assert_eq!(submitted.awaiting_tasks.len(), 1);

        let grade = GradeRequest {
            hifdh: 4.0,
            rules: 3.0,
            notes: None,
        }
        .into_record(c.teacher_id)
        .unwrap();
        let graded = c
            .storage
            .grade_submission(written.submission.id, grade)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.score, Some(7.0));

        let after = dashboard(&c).await;
        assert_eq!(after.stats.ayah_count, 5);
        assert_eq!(after.stats.accuracy_pct, 70);
        assert_eq!(after.stats.pending_tasks_count, 0);
        assert_eq!(after.completed_tasks.len(), 1);
    }

    async fn submit_and_grade(c: &Circle, hifdh: f64, rules: f64) {
        let written = c
            .storage
            .upsert_submission(c.task_id, c.student_id, audio("a1", c.student_id))
            .await
            .unwrap();
        let grade = GradeRequest {
            hifdh,
            rules,
            notes: None,
        }
        .into_record(c.teacher_id)
        .unwrap();
        c.storage
            .grade_submission(written.submission.id, grade)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reassign_same_halaqa_keeps_history() {
        let c = circle().await;
        submit_and_grade(&c, 4.0, 3.0).await;
        let halaqa_id = dashboard(&c).await.halaqa.unwrap().id;

        // 时间戳精度为秒
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(
            c.storage
                .set_student_halaqa(c.student_id, Some(halaqa_id))
                .await
                .unwrap()
        );

        let after = dashboard(&c).await;
        assert_eq!(after.stats.ayah_count, 5);
        assert_eq!(after.stats.accuracy_pct, 70);
        assert_eq!(after.completed_tasks.len(), 1);
        assert_eq!(after.stats.pending_tasks_count, 0);
    }

    #[tokio::test]
    async fn test_moving_halaqa_keeps_memorization_record() {
        let c = circle().await;
        submit_and_grade(&c, 4.0, 3.0).await;

        let other = c
            .storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Al-Huda".into(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        c.storage
            .set_student_halaqa(c.student_id, Some(other.id))
            .await
            .unwrap();

        let after = dashboard(&c).await;
        assert_eq!(after.halaqa.unwrap().id, other.id);
        // 旧 halaqa 的任务不再出现在列表中
        assert!(after.completed_tasks.is_empty());
        assert_eq!(after.stats.pending_tasks_count, 0);
        assert_eq!(after.stats.ayah_count, 5);
        assert_eq!(after.stats.accuracy_pct, 70);
    }

    #[tokio::test]
    async fn test_retry_returns_task_to_pending() {
        let c = circle().await;
        let written = c
            .storage
            .upsert_submission(c.task_id, c.student_id, audio("a1", c.student_id))
            .await
            .unwrap();
        let grade = GradeRequest {
            hifdh: 5.0,
            rules: 5.0,
            notes: Some("ممتاز".into()),
        }
        .into_record(c.teacher_id)
        .unwrap();
        c.storage
            .grade_submission(written.submission.id, grade)
            .await
            .unwrap();

        let removed = c
            .storage
            .delete_submission(c.task_id, c.student_id)
            .await
            .unwrap();
        assert!(removed.is_some());

        let after = dashboard(&c).await;
        assert_eq!(after.stats.pending_tasks_count, 1);
        assert!(after.pending_tasks[0].submission.is_none());
        assert_eq!(after.stats.accuracy_pct, 0);
    }

    #[tokio::test]
    async fn test_failing_grade_stays_pending() {
        let c = circle().await;
        let written = c
            .storage
            .upsert_submission(c.task_id, c.student_id, audio("a1", c.student_id))
            .await
            .unwrap();
        let grade = GradeRequest {
            hifdh: 2.0,
            rules: 2.0,
            notes: None,
        }
        .into_record(c.teacher_id)
        .unwrap();
        c.storage
            .grade_submission(written.submission.id, grade)
            .await
            .unwrap();

        let after = dashboard(&c).await;
        assert_eq!(after.stats.pending_tasks_count, 1);
        assert_eq!(after.stats.ayah_count, 0);
    }

    #[tokio::test]
    async fn test_attendance_created_once_per_day() {
        let c = circle().await;
        dashboard(&c).await;
        let second = dashboard(&c).await;

        let records = c
            .storage
            .list_attendance(c.student_id, today(), today())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(second.weekly_attendance.len(), 7);
        assert_eq!(
            second.weekly_attendance[6].status,
            crate::models::attendance::responses::SlotStatus::Present
        );
        assert_eq!(second.stats.presence_pct, 14);
    }
}
