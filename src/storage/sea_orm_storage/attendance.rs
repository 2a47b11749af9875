//! 出勤存储操作

use super::SeaOrmStorage;
use crate::entity::attendance::{ActiveModel, Column, Entity as AttendanceEntity, Model};
use crate::errors::{HifzError, Result};
use crate::models::attendance::entities::{Attendance, AttendanceStatus};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl SeaOrmStorage {
    async fn find_attendance(&self, student_id: i64, date: NaiveDate) -> Result<Option<Model>> {
        AttendanceEntity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Date.eq(date_key(date)))
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询出勤记录失败: {e}")))
    }

    /// 当天没有记录时创建 present，并发重复写入由唯一约束兜底
    pub async fn ensure_attendance_impl(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<(Attendance, bool)> {
        if let Some(existing) = self.find_attendance(student_id, date).await? {
            return Ok((existing.into_attendance(), false));
        }

        let model = ActiveModel {
            student_id: Set(student_id),
            date: Set(date_key(date)),
            status: Set(AttendanceStatus::Present.to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok((created.into_attendance(), true)),
            Err(e) => match HifzError::from_db(e, "创建出勤记录失败") {
                HifzError::Conflict(_) => self
                    .find_attendance(student_id, date)
                    .await?
                    .map(|m| (m.into_attendance(), false))
                    .ok_or_else(|| HifzError::database_operation("出勤记录冲突后未找到记录")),
                other => Err(other),
            },
        }
    }

    /// 设置某天的出勤状态
    pub async fn mark_attendance_impl(
        &self,
        student_id: i64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<Attendance> {
        let saved = match self.find_attendance(student_id, date).await? {
            Some(existing) => {
                let mut model = existing.into_active_model();
                model.status = Set(status.to_string());
                model.update(&self.db).await
            }
            None => {
                ActiveModel {
                    student_id: Set(student_id),
                    date: Set(date_key(date)),
                    status: Set(status.to_string()),
                    created_at: Set(chrono::Utc::now().timestamp()),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
            }
        }
        .map_err(|e| HifzError::from_db(e, "保存出勤记录失败"))?;

        Ok(saved.into_attendance())
    }

    /// 列出 [from, to] 区间内的出勤记录
    pub async fn list_attendance_impl(
        &self,
        student_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let results = AttendanceEntity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Date.gte(date_key(from)))
            .filter(Column::Date.lte(date_key(to)))
            .order_by_asc(Column::Date)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询出勤记录失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_attendance()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, record};
    use crate::models::attendance::entities::AttendanceStatus;
    use crate::models::users::entities::UserRole;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_ensure_is_idempotent_per_day() {
        let storage = memory_storage().await;
        let student = storage
            .register_user_impl(record("ali", UserRole::Student, None))
            .await
            .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        let (first, created) = storage
            .ensure_attendance_impl(student.user.id, today)
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.status, AttendanceStatus::Present);

        let (second, created) = storage
            .ensure_attendance_impl(student.user.id, today)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);

        let tomorrow = today.succ_opt().unwrap();
        let (_, created) = storage
            .ensure_attendance_impl(student.user.id, tomorrow)
            .await
            .unwrap();
        assert!(created);

        let week = storage
            .list_attendance_impl(student.user.id, today, tomorrow)
            .await
            .unwrap();
        assert_eq!(week.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_overrides_status() {
        let storage = memory_storage().await;
        let student = storage
            .register_user_impl(record("ali", UserRole::Student, None))
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        storage
            .ensure_attendance_impl(student.user.id, day)
            .await
            .unwrap();
        let marked = storage
            .mark_attendance_impl(student.user.id, day, AttendanceStatus::Late)
            .await
            .unwrap();
        assert_eq!(marked.status, AttendanceStatus::Late);

        // 已被标记的记录不会被首页访问覆盖
        let (kept, _) = storage
            .ensure_attendance_impl(student.user.id, day)
            .await
            .unwrap();
        assert_eq!(kept.status, AttendanceStatus::Late);
    }
}
