use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 任务类型：新背诵 / 复习
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub enum TaskKind {
    Recitation,
    Review,
}

impl_string_enum!(TaskKind, "任务类型", {
    Recitation => "recitation",
    Review => "review",
});

// 任务（创建后不可修改）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/task.ts")]
pub struct Task {
    pub id: i64,
    pub halaqa_id: i64,
    pub created_by: i64,
    pub kind: TaskKind,
    pub surah_id: i32,
    pub start_ayah: i32,
    pub end_ayah: i32,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    /// 指定学生的任务，只对该学生可见
    pub student_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    /// 任务包含的 ayah 数
    pub fn ayah_span(&self) -> i64 {
        i64::from(self.end_ayah - self.start_ayah + 1)
    }

    /// 展示标题：`<surah> <start>-<end>`
    pub fn title(&self, surah_name: &str) -> String {
        format!("{surah_name} {}-{}", self.start_ayah, self.end_ayah)
    }

    /// 对加入时间为 `joined_at` 的学生是否可见
    pub fn visible_to(&self, student_id: i64, joined_at: Option<chrono::DateTime<chrono::Utc>>) -> bool {
        if self.student_id.is_some_and(|target| target != student_id) {
            return false;
        }
        joined_at.is_none_or(|joined| self.created_at >= joined)
    }

    pub fn is_past_deadline(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn task(student_id: Option<i64>) -> Task {
        Task {
            id: 1,
            halaqa_id: 1,
            created_by: 2,
            kind: TaskKind::Recitation,
            surah_id: 2,
            start_ayah: 1,
            end_ayah: 5,
            deadline: None,
            student_id,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_title_and_span() {
        let t = task(None);
        assert_eq!(t.title("البقرة"), "البقرة 1-5");
        assert_eq!(t.ayah_span(), 5);
    }

    #[test]
    fn test_visibility() {
        let t = task(None);
        let before = t.created_at - Duration::days(1);
        let after = t.created_at + Duration::days(1);
        assert!(t.visible_to(10, Some(before)));
        assert!(t.visible_to(10, Some(t.created_at)));
        // 加入之前创建的任务不可见
        assert!(!t.visible_to(10, Some(after)));

        let targeted = task(Some(10));
        assert!(targeted.visible_to(10, Some(before)));
        assert!(!targeted.visible_to(11, Some(before)));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("review".parse::<TaskKind>(), Ok(TaskKind::Review));
        assert!("memorize".parse::<TaskKind>().is_err());
    }
}
