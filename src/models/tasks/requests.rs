use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use super::entities::TaskKind;

/// 为整个 halaqa 创建任务
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct CreateTaskRequest {
    pub halaqa_id: i64,
    pub kind: TaskKind,
    pub surah_id: i32,
    pub start_ayah: i32,
    pub end_ayah: i32,
    pub deadline: Option<DateTime<Utc>>, // ISO 8601 格式，如 "2026-03-01T12:00:00Z"
}

/// 为单个学生创建任务，halaqa 取学生当前所在的 halaqa
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct CreateStudentTaskRequest {
    pub student_id: i64,
    pub kind: TaskKind,
    pub surah_id: i32,
    pub start_ayah: i32,
    pub end_ayah: i32,
    pub deadline: Option<DateTime<Utc>>,
}

/// 任务列表过滤参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct TaskListParams {
    pub kind: Option<TaskKind>,
}

// 新任务记录（用于存储层）
#[derive(Debug, Clone)]
pub struct NewTaskRecord {
    pub halaqa_id: i64,
    pub created_by: i64,
    pub kind: TaskKind,
    pub surah_id: i32,
    pub start_ayah: i32,
    pub end_ayah: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub student_id: Option<i64>,
}
