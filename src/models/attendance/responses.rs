use serde::Serialize;
use ts_rs::TS;

use super::entities::AttendanceStatus;

/// 周视图中一天的状态，没有记录时为 unmarked
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub enum SlotStatus {
    Present,
    Absent,
    Late,
    Unmarked,
}

impl From<Option<AttendanceStatus>> for SlotStatus {
    fn from(status: Option<AttendanceStatus>) -> Self {
        match status {
            Some(AttendanceStatus::Present) => SlotStatus::Present,
            Some(AttendanceStatus::Absent) => SlotStatus::Absent,
            Some(AttendanceStatus::Late) => SlotStatus::Late,
            None => SlotStatus::Unmarked,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceSlot {
    pub date: chrono::NaiveDate,
    pub status: SlotStatus,
}

/// 最近 7 天出勤（今天在最后）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct WeeklyAttendanceResponse {
    pub days: Vec<AttendanceSlot>,
    pub presence_pct: i64,
}
