use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    attendance::entities::{Attendance, AttendanceStatus},
    files::entities::{File, NewFileRecord},
    halaqat::{
        entities::{Halaqa, HalaqaTeacher},
        requests::{CreateHalaqaRequest, UpdateHalaqaRequest},
    },
    notifications::responses::NotificationListResponse,
    submissions::{
        entities::{Submission, SubmissionRemoval, SubmissionWrite},
        requests::{GradeRecord, SubmissionListQuery},
        responses::SubmissionListResponse,
    },
    surahs::entities::Surah,
    tasks::{
        entities::{Task, TaskKind},
        requests::NewTaskRecord,
    },
    users::{
        entities::{Profile, TeacherStatus, User},
        requests::{RegisterUserRecord, UpdateProfileFields, UpdateUserRequest, UserListQuery},
        responses::{UserListResponse, UserWithProfile},
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 注册用户：用户与资料在同一事务中创建
    async fn register_user(&self, record: RegisterUserRecord) -> Result<UserWithProfile>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 获取用户及其资料
    async fn get_user_with_profile(&self, id: i64) -> Result<Option<UserWithProfile>>;
    // 批量获取用户及资料
    async fn list_users_with_profiles_by_ids(&self, ids: &[i64]) -> Result<Vec<UserWithProfile>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户账号信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 更新用户资料
    async fn update_profile(
        &self,
        user_id: i64,
        update: UpdateProfileFields,
    ) -> Result<Option<Profile>>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;
    // 审核教师：审核状态与账号状态在同一事务中更新
    async fn set_teacher_status(
        &self,
        user_id: i64,
        status: TeacherStatus,
    ) -> Result<Option<UserWithProfile>>;
    // 设置学生所在 halaqa，None 表示移出
    async fn set_student_halaqa(&self, student_id: i64, halaqa_id: Option<i64>) -> Result<bool>;
    // 列出 halaqa 当前的学生
    async fn list_halaqa_students(&self, halaqa_id: i64) -> Result<Vec<UserWithProfile>>;

    /// halaqa 管理方法
    async fn create_halaqa(&self, req: CreateHalaqaRequest) -> Result<Halaqa>;
    async fn get_halaqa_by_id(&self, halaqa_id: i64) -> Result<Option<Halaqa>>;
    async fn update_halaqa(
        &self,
        halaqa_id: i64,
        update: UpdateHalaqaRequest,
    ) -> Result<Option<Halaqa>>;
    async fn list_halaqat(&self) -> Result<Vec<Halaqa>>;
    // 列出教师负责的 halaqa
    async fn list_teacher_halaqat(&self, teacher_id: i64) -> Result<Vec<Halaqa>>;
    async fn list_halaqa_teacher_ids(&self, halaqa_id: i64) -> Result<Vec<i64>>;
    async fn is_halaqa_teacher(&self, halaqa_id: i64, teacher_id: i64) -> Result<bool>;
    async fn add_halaqa_teacher(&self, halaqa_id: i64, teacher_id: i64) -> Result<HalaqaTeacher>;
    async fn remove_halaqa_teacher(&self, halaqa_id: i64, teacher_id: i64) -> Result<bool>;
    // 每个 halaqa 的学生数
    async fn count_students_by_halaqa(&self) -> Result<HashMap<i64, i64>>;
    // 按名称补齐 halaqa，返回新建数量
    async fn ensure_halaqat(&self, names: &[String]) -> Result<u64>;

    /// surah 参考数据
    async fn seed_surahs(&self) -> Result<u64>;
    async fn list_surahs(&self) -> Result<Vec<Surah>>;
    async fn get_surah_by_id(&self, surah_id: i32) -> Result<Option<Surah>>;

    /// 任务管理方法
    async fn create_task(&self, record: NewTaskRecord) -> Result<Task>;
    async fn get_task_by_id(&self, task_id: i64) -> Result<Option<Task>>;
    async fn list_tasks_by_ids(&self, task_ids: &[i64]) -> Result<Vec<Task>>;
    // 列出 halaqa 的任务（新的在前）
    async fn list_halaqa_tasks(&self, halaqa_ids: &[i64], kind: Option<TaskKind>)
    -> Result<Vec<Task>>;
    // 列出学生可见的任务：本 halaqa 的公共任务与指定给该学生的任务，且创建于加入之后
    async fn list_student_tasks(
        &self,
        student_id: i64,
        halaqa_id: i64,
        joined_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>>;

    /// 提交管理方法
    // 上传音频后写入提交：新建或替换音频并清空之前的评分
    async fn upsert_submission(
        &self,
        task_id: i64,
        student_id: i64,
        file: NewFileRecord,
    ) -> Result<SubmissionWrite>;
    // 删除提交（重做）
    async fn delete_submission(
        &self,
        task_id: i64,
        student_id: i64,
    ) -> Result<Option<SubmissionRemoval>>;
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    async fn list_student_submissions(&self, student_id: i64) -> Result<Vec<Submission>>;
    async fn list_task_submissions(&self, task_ids: &[i64]) -> Result<Vec<Submission>>;
    // 评分
    async fn grade_submission(
        &self,
        submission_id: i64,
        grade: GradeRecord,
    ) -> Result<Option<Submission>>;
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;

    /// 文件
    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>>;

    /// 出勤
    // 当天首次访问时创建 present 记录，返回记录及是否新建
    async fn ensure_attendance(&self, student_id: i64, date: NaiveDate)
    -> Result<(Attendance, bool)>;
    async fn mark_attendance(
        &self,
        student_id: i64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<Attendance>;
    async fn list_attendance(
        &self,
        student_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>>;

    /// 通知
    async fn create_notifications(
        &self,
        sender_id: i64,
        recipient_ids: &[i64],
        title: &str,
        message: &str,
    ) -> Result<u64>;
    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        page: i64,
        size: i64,
        unread_only: bool,
    ) -> Result<NotificationListResponse>;
    async fn count_unread_notifications(&self, user_id: i64) -> Result<i64>;
    async fn mark_notification_read(&self, user_id: i64, notification_id: i64) -> Result<bool>;
    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
