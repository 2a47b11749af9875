use serde::{Deserialize, Serialize};
use ts_rs::TS;

// halaqa（学习圈）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct Halaqa {
    pub id: i64,
    pub name: String,
    /// 学习范围起始 juz（1..=30），未设置表示不限
    pub juz_from: Option<i32>,
    pub juz_to: Option<i32>,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// halaqa 与教师的关联
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct HalaqaTeacher {
    pub halaqa_id: i64,
    pub teacher_id: i64,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
}
