use serde::Serialize;
use ts_rs::TS;

use super::entities::Task;
use crate::models::submissions::entities::Submission;

/// 教师视角的任务项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct TaskItem {
    pub task: Task,
    pub surah_name: String,
    pub title: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct TaskListResponse {
    pub items: Vec<TaskItem>,
}

/// 学生视角的任务：附带本人的提交与逾期标记
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct StudentTaskView {
    pub task: Task,
    pub surah_name: String,
    pub title: String,
    pub submission: Option<Submission>,
    /// 已过截止时间且未提交
    pub is_late: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct StudentTaskListResponse {
    pub items: Vec<StudentTaskView>,
}
