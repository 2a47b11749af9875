use serde::Deserialize;
use ts_rs::TS;

use super::entities::SubmissionStatus;
use crate::models::common::PaginationQuery;
use crate::models::tasks::entities::TaskKind;
use crate::policy;

/// 评分请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct GradeRequest {
    /// 背诵分 0-5
    pub hifdh: f64,
    /// 规则（tajweed）分 0-5
    pub rules: f64,
    pub notes: Option<String>,
}

impl GradeRequest {
    /// 校验分数并生成评分记录，score = hifdh + rules
    pub fn into_record(self, graded_by: i64) -> Result<GradeRecord, String> {
        if !policy::is_valid_sub_score(self.hifdh) {
            return Err(format!(
                "hifdh 必须在 0 到 {} 之间",
                policy::MAX_SUB_SCORE
            ));
        }
        if !policy::is_valid_sub_score(self.rules) {
            return Err(format!(
                "rules 必须在 0 到 {} 之间",
                policy::MAX_SUB_SCORE
            ));
        }
        Ok(GradeRecord {
            hifdh: self.hifdh,
            rules: self.rules,
            score: self.hifdh + self.rules,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            graded_by,
        })
    }
}

// 评分记录（用于存储层）
#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub hifdh: f64,
    pub rules: f64,
    pub score: f64,
    pub notes: Option<String>,
    pub graded_by: i64,
}

/// 教师待评列表查询参数（HTTP 请求）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    /// 默认 submitted
    pub status: Option<SubmissionStatus>,
    pub kind: Option<TaskKind>,
    pub halaqa_id: Option<i64>,
}

// 用于存储层的内部查询参数
#[derive(Debug, Clone)]
pub struct SubmissionListQuery {
    pub page: i64,
    pub size: i64,
    pub status: Option<SubmissionStatus>,
    pub kind: Option<TaskKind>,
    /// 限定在这些 halaqa 内
    pub halaqa_ids: Vec<i64>,
}
