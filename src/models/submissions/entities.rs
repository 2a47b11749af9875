use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::policy;

// 提交状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum SubmissionStatus {
    Submitted,
    Reviewing,
    Graded,
}

impl_string_enum!(SubmissionStatus, "提交状态", {
    Submitted => "submitted",
    Reviewing => "reviewing",
    Graded => "graded",
});

// 音频提交，每个 (task, student) 至多一条
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Submission {
    pub id: i64,
    pub task_id: i64,
    pub student_id: i64,
    pub audio_token: String,
    pub status: SubmissionStatus,
    pub hifdh: Option<f64>,
    pub rules: Option<f64>,
    pub score: Option<f64>,
    pub notes: Option<String>,
    pub graded_by: Option<i64>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Submission {
    /// 已评分时的分数
    pub fn graded_score(&self) -> Option<f64> {
        match self.status {
            SubmissionStatus::Graded => self.score,
            _ => None,
        }
    }

    /// 已评分且及格
    pub fn is_passed(&self) -> bool {
        self.graded_score().is_some_and(policy::is_passing)
    }

    /// 已评分但不及格，需要重做
    pub fn is_failed(&self) -> bool {
        self.graded_score().is_some_and(|s| !policy::is_passing(s))
    }

    /// 等待教师评分
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self.status,
            SubmissionStatus::Submitted | SubmissionStatus::Reviewing
        )
    }

    pub fn audio_url(&self) -> String {
        format!("/api/v1/submissions/{}/audio", self.id)
    }
}

/// 提交写入结果，附带引用计数归零、需要从磁盘删除的文件
#[derive(Debug, Clone)]
pub struct SubmissionWrite {
    pub submission: Submission,
    pub orphaned_file: Option<String>,
}

/// 重做（删除提交）结果
#[derive(Debug, Clone)]
pub struct SubmissionRemoval {
    pub submission_id: i64,
    pub orphaned_file: Option<String>,
}
