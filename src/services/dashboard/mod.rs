pub mod aggregate;
pub mod student;
pub mod teacher;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::Result;
use crate::models::dashboard::responses::TeacherStats;
use crate::models::halaqat::entities::Halaqa;
use crate::models::submissions::entities::Submission;
use crate::models::tasks::entities::Task;
use crate::models::tasks::responses::StudentTaskView;
use crate::models::users::entities::{User, UserRole};
use crate::models::users::responses::UserWithProfile;
use crate::storage::Storage;

pub struct DashboardService {
    storage: Option<Arc<dyn Storage>>,
}

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    #[cfg(test)]
    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::resolve_storage(&self.storage, request)
    }

    pub async fn student_dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        student::handle_student_dashboard(self, request).await
    }

    pub async fn teacher_dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        teacher::handle_teacher_dashboard(self, request).await
    }
}

/// surah 编号到名称
pub(crate) async fn surah_names(storage: &dyn Storage) -> Result<HashMap<i32, String>> {
    Ok(storage
        .list_surahs()
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect())
}

/// 学生可见的任务及本人提交；不在任何 halaqa 时为空
pub(crate) async fn load_student_views(
    storage: &dyn Storage,
    student: &UserWithProfile,
    now: DateTime<Utc>,
) -> Result<Vec<StudentTaskView>> {
    let Some(profile) = &student.profile else {
        return Ok(Vec::new());
    };
    let Some(halaqa_id) = profile.halaqa_id else {
        return Ok(Vec::new());
    };

    let tasks = storage
        .list_student_tasks(student.user.id, halaqa_id, profile.halaqa_joined_at)
        .await?;
    let submissions = storage.list_student_submissions(student.user.id).await?;
    let names = surah_names(storage).await?;
    Ok(aggregate::project_student_tasks(
        tasks,
        &submissions,
        &names,
        now,
    ))
}

/// 学生待完成任务数，首页与提交响应共用
pub(crate) async fn student_pending_count(
    storage: &dyn Storage,
    student_id: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    match storage.get_user_with_profile(student_id).await? {
        Some(student) => Ok(aggregate::pending_tasks_count(
            &load_student_views(storage, &student, now).await?,
        )),
        None => Ok(0),
    }
}

/// 教师负责范围内的数据：管理员看到全部 halaqa
pub(crate) struct TeacherScope {
    pub halaqat: Vec<Halaqa>,
    pub tasks: Vec<Task>,
    pub submissions: Vec<Submission>,
    pub student_counts: HashMap<i64, i64>,
}

impl TeacherScope {
    pub fn halaqa_ids(&self) -> Vec<i64> {
        self.halaqat.iter().map(|h| h.id).collect()
    }

    pub fn student_count(&self) -> i64 {
        self.halaqat
            .iter()
            .filter_map(|h| self.student_counts.get(&h.id))
            .sum()
    }

    pub fn stats(&self) -> TeacherStats {
        aggregate::teacher_stats(
            self.halaqat.len() as i64,
            self.student_count(),
            &self.tasks,
            &self.submissions,
        )
    }
}

pub(crate) async fn load_teacher_scope(storage: &dyn Storage, teacher: &User) -> Result<TeacherScope> {
    let halaqat = if teacher.role == UserRole::Admin {
        storage.list_halaqat().await?
    } else {
        storage.list_teacher_halaqat(teacher.id).await?
    };
    let ids: Vec<i64> = halaqat.iter().map(|h| h.id).collect();
    let tasks = storage.list_halaqa_tasks(&ids, None).await?;
    let task_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    let submissions = storage.list_task_submissions(&task_ids).await?;
    let student_counts = storage.count_students_by_halaqa().await?;

    Ok(TeacherScope {
        halaqat,
        tasks,
        submissions,
        student_counts,
    })
}
