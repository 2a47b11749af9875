use serde::Deserialize;
use ts_rs::TS;

use crate::models::attendance::entities::AttendanceStatus;

/// 创建 halaqa 请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct CreateHalaqaRequest {
    pub name: String,
    pub juz_from: Option<i32>,
    pub juz_to: Option<i32>,
    pub description: Option<String>,
}

/// 更新 halaqa 请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct UpdateHalaqaRequest {
    pub name: Option<String>,
    pub juz_from: Option<i32>,
    pub juz_to: Option<i32>,
    pub description: Option<String>,
}

/// 为 halaqa 指派教师
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct AssignTeacherRequest {
    pub teacher_id: i64,
}

/// 教师标记学生出勤
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct MarkAttendanceRequest {
    pub student_id: i64,
    /// 不传时为今天
    pub date: Option<chrono::NaiveDate>,
    pub status: AttendanceStatus,
}
