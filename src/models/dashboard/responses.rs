use serde::Serialize;
use ts_rs::TS;

use crate::models::attendance::responses::AttendanceSlot;
use crate::models::halaqat::entities::Halaqa;
use crate::models::submissions::responses::SubmissionListItem;
use crate::models::tasks::responses::StudentTaskView;

/// 学生统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct StudentStats {
    /// 已评分提交的平均得分率（百分比，取整）
    pub accuracy_pct: i64,
    /// 最近 7 天出勤率（百分比，取整）
    pub presence_pct: i64,
    /// 已及格的背诵任务 ayah 总数
    pub ayah_count: i64,
    pub pending_tasks_count: i64,
    pub weekly_hifdh_score: f64,
    pub weekly_review_score: f64,
}

/// 学生首页
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct StudentDashboardResponse {
    pub halaqa: Option<Halaqa>,
    pub stats: StudentStats,
    /// 未提交或不及格
    pub pending_tasks: Vec<StudentTaskView>,
    /// 已及格
    pub completed_tasks: Vec<StudentTaskView>,
    /// 等待评分
    pub awaiting_tasks: Vec<StudentTaskView>,
    pub weekly_attendance: Vec<AttendanceSlot>,
    pub unread_notifications: i64,
}

/// 教师统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct TeacherStats {
    pub pending_submissions_count: i64,
    pub student_count: i64,
    pub halaqa_count: i64,
    pub average_performance: f64,
}

/// 单个 halaqa 的概况
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct HalaqaSummary {
    pub halaqa: Halaqa,
    pub student_count: i64,
    pub last_recitation_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_review_at: Option<chrono::DateTime<chrono::Utc>>,
    pub average_performance: f64,
}

/// 教师首页
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct TeacherDashboardResponse {
    pub stats: TeacherStats,
    pub halaqat: Vec<HalaqaSummary>,
    pub recent_submissions: Vec<SubmissionListItem>,
}

/// halaqa 详情中的学生行
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct HalaqaStudentRow {
    pub student_id: i64,
    pub name: String,
    pub avatar_url: Option<String>,
    pub joined_at: Option<chrono::DateTime<chrono::Utc>>,
    /// 已评分提交的平均分，没有时为空
    pub average_score: Option<f64>,
    /// 逾期未提交的任务数
    pub late_count: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct TeacherBrief {
    pub id: i64,
    pub name: String,
}

/// halaqa 详情
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct HalaqaDetailResponse {
    pub summary: HalaqaSummary,
    pub teachers: Vec<TeacherBrief>,
    pub students: Vec<HalaqaStudentRow>,
}
