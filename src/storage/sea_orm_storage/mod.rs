//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod attendance;
mod files;
mod halaqat;
mod notifications;
mod submissions;
mod surahs;
mod tasks;
mod users;

use crate::config::AppConfig;
use crate::errors::{HifzError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| HifzError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| HifzError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| HifzError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| HifzError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(HifzError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use std::collections::HashMap;

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
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn register_user(&self, record: RegisterUserRecord) -> Result<UserWithProfile> {
        self.register_user_impl(record).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn get_user_with_profile(&self, id: i64) -> Result<Option<UserWithProfile>> {
        self.get_user_with_profile_impl(id).await
    }

    async fn list_users_with_profiles_by_ids(&self, ids: &[i64]) -> Result<Vec<UserWithProfile>> {
        self.list_users_with_profiles_by_ids_impl(ids).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: UpdateProfileFields,
    ) -> Result<Option<Profile>> {
        self.update_profile_impl(user_id, update).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    async fn set_teacher_status(
        &self,
        user_id: i64,
        status: TeacherStatus,
    ) -> Result<Option<UserWithProfile>> {
        self.set_teacher_status_impl(user_id, status).await
    }

    async fn set_student_halaqa(&self, student_id: i64, halaqa_id: Option<i64>) -> Result<bool> {
        self.set_student_halaqa_impl(student_id, halaqa_id).await
    }

    async fn list_halaqa_students(&self, halaqa_id: i64) -> Result<Vec<UserWithProfile>> {
        self.list_halaqa_students_impl(halaqa_id).await
    }

    // halaqa 模块
    async fn create_halaqa(&self, req: CreateHalaqaRequest) -> Result<Halaqa> {
        self.create_halaqa_impl(req).await
    }

    async fn get_halaqa_by_id(&self, halaqa_id: i64) -> Result<Option<Halaqa>> {
        self.get_halaqa_by_id_impl(halaqa_id).await
    }

    async fn update_halaqa(
        &self,
        halaqa_id: i64,
        update: UpdateHalaqaRequest,
    ) -> Result<Option<Halaqa>> {
        self.update_halaqa_impl(halaqa_id, update).await
    }

    async fn list_halaqat(&self) -> Result<Vec<Halaqa>> {
        self.list_halaqat_impl().await
    }

    async fn list_teacher_halaqat(&self, teacher_id: i64) -> Result<Vec<Halaqa>> {
        self.list_teacher_halaqat_impl(teacher_id).await
    }

    async fn list_halaqa_teacher_ids(&self, halaqa_id: i64) -> Result<Vec<i64>> {
        self.list_halaqa_teacher_ids_impl(halaqa_id).await
    }

    async fn is_halaqa_teacher(&self, halaqa_id: i64, teacher_id: i64) -> Result<bool> {
        self.is_halaqa_teacher_impl(halaqa_id, teacher_id).await
    }

    async fn add_halaqa_teacher(&self, halaqa_id: i64, teacher_id: i64) -> Result<HalaqaTeacher> {
        self.add_halaqa_teacher_impl(halaqa_id, teacher_id).await
    }

    async fn remove_halaqa_teacher(&self, halaqa_id: i64, teacher_id: i64) -> Result<bool> {
        self.remove_halaqa_teacher_impl(halaqa_id, teacher_id).await
    }

    async fn count_students_by_halaqa(&self) -> Result<HashMap<i64, i64>> {
        self.count_students_by_halaqa_impl().await
    }

    async fn ensure_halaqat(&self, names: &[String]) -> Result<u64> {
        self.ensure_halaqat_impl(names).await
    }

    // surah 模块
    async fn seed_surahs(&self) -> Result<u64> {
        self.seed_surahs_impl().await
    }

    async fn list_surahs(&self) -> Result<Vec<Surah>> {
        self.list_surahs_impl().await
    }

    async fn get_surah_by_id(&self, surah_id: i32) -> Result<Option<Surah>> {
        self.get_surah_by_id_impl(surah_id).await
    }

    // 任务模块
    async fn create_task(&self, record: NewTaskRecord) -> Result<Task> {
        self.create_task_impl(record).await
    }

    async fn get_task_by_id(&self, task_id: i64) -> Result<Option<Task>> {
        self.get_task_by_id_impl(task_id).await
    }

    async fn list_tasks_by_ids(&self, task_ids: &[i64]) -> Result<Vec<Task>> {
        self.list_tasks_by_ids_impl(task_ids).await
    }

    async fn list_halaqa_tasks(
        &self,
        halaqa_ids: &[i64],
        kind: Option<TaskKind>,
    ) -> Result<Vec<Task>> {
        self.list_halaqa_tasks_impl(halaqa_ids, kind).await
    }

    async fn list_student_tasks(
        &self,
        student_id: i64,
        halaqa_id: i64,
        joined_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>> {
        self.list_student_tasks_impl(student_id, halaqa_id, joined_at)
            .await
    }

    // 提交模块
    async fn upsert_submission(
        &self,
        task_id: i64,
        student_id: i64,
        file: NewFileRecord,
    ) -> Result<SubmissionWrite> {
        self.upsert_submission_impl(task_id, student_id, file).await
    }

    async fn delete_submission(
        &self,
        task_id: i64,
        student_id: i64,
    ) -> Result<Option<SubmissionRemoval>> {
        self.delete_submission_impl(task_id, student_id).await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn list_student_submissions(&self, student_id: i64) -> Result<Vec<Submission>> {
        self.list_student_submissions_impl(student_id).await
    }

    async fn list_task_submissions(&self, task_ids: &[i64]) -> Result<Vec<Submission>> {
        self.list_task_submissions_impl(task_ids).await
    }

    async fn grade_submission(
        &self,
        submission_id: i64,
        grade: GradeRecord,
    ) -> Result<Option<Submission>> {
        self.grade_submission_impl(submission_id, grade).await
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        self.list_submissions_with_pagination_impl(query).await
    }

    // 文件模块
    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>> {
        self.get_file_by_token_impl(token).await
    }

    // 出勤模块
    async fn ensure_attendance(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<(Attendance, bool)> {
        self.ensure_attendance_impl(student_id, date).await
    }

    async fn mark_attendance(
        &self,
        student_id: i64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<Attendance> {
        self.mark_attendance_impl(student_id, date, status).await
    }

    async fn list_attendance(
        &self,
        student_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        self.list_attendance_impl(student_id, from, to).await
    }

    // 通知模块
    async fn create_notifications(
        &self,
        sender_id: i64,
        recipient_ids: &[i64],
        title: &str,
        message: &str,
    ) -> Result<u64> {
        self.create_notifications_impl(sender_id, recipient_ids, title, message)
            .await
    }

    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        page: i64,
        size: i64,
        unread_only: bool,
    ) -> Result<NotificationListResponse> {
        self.list_notifications_with_pagination_impl(user_id, page, size, unread_only)
            .await
    }

    async fn count_unread_notifications(&self, user_id: i64) -> Result<i64> {
        self.count_unread_notifications_impl(user_id).await
    }

    async fn mark_notification_read(&self, user_id: i64, notification_id: i64) -> Result<bool> {
        self.mark_notification_read_impl(user_id, notification_id)
            .await
    }

    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64> {
        self.mark_all_notifications_read_impl(user_id).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SeaOrmStorage;
    use crate::models::users::{
        entities::{Gender, UserRole},
        requests::RegisterUserRecord,
    };
    use migration::{Migrator, MigratorTrait};
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    /// 内存 SQLite，单连接保证所有查询看到同一个数据库
    pub async fn memory_storage() -> SeaOrmStorage {
        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("parse sqlite url")
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .expect("connect sqlite");
        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
        Migrator::up(&db, None).await.expect("run migrations");
        SeaOrmStorage { db }
    }

    pub fn record(username: &str, role: UserRole, halaqa_id: Option<i64>) -> RegisterUserRecord {
        RegisterUserRecord {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            role,
            display_name: None,
            halaqa_id,
            gender: Some(Gender::Male),
            birth_date: None,
            guardian_phone: None,
            institution: None,
            bio: None,
        }
    }
}
