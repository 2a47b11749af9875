use serde::Serialize;
use ts_rs::TS;

use super::entities::{Submission, SubmissionStatus};
use crate::models::PaginationInfo;
use crate::models::dashboard::responses::TeacherStats;
use crate::models::tasks::entities::TaskKind;

/// 提交后刷新的统计
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmitStats {
    pub pending_tasks_count: i64,
}

/// 提交 / 重新提交响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmitResponse {
    pub submission: Submission,
    pub new_stats: SubmitStats,
}

/// 评分页使用的提交详情
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionDetail {
    pub id: i64,
    pub task_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub avatar_url: Option<String>,
    pub task_title: String,
    pub kind: TaskKind,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub audio_url: String,
    pub notes: Option<String>,
    pub hifdh: Option<f64>,
    pub rules: Option<f64>,
    pub score: Option<f64>,
    pub status: SubmissionStatus,
}

/// 评分响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct GradeResponse {
    pub submission: Submission,
    pub stats: TeacherStats,
}

/// 提交列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListItem {
    pub id: i64,
    pub task_id: i64,
    pub halaqa_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub kind: TaskKind,
    pub task_title: String,
    pub status: SubmissionStatus,
    pub score: Option<f64>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// 提交列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListResponse {
    pub items: Vec<SubmissionListItem>,
    pub pagination: PaginationInfo,
}
