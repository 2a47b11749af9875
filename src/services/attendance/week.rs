use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;

use super::AttendanceService;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::attendance::responses::WeeklyAttendanceResponse;
use crate::policy::WEEK_WINDOW_DAYS;
use crate::services::dashboard::aggregate;
use crate::services::{current_user, internal_error};
use crate::storage::Storage;

pub(crate) async fn weekly_attendance(
    storage: &dyn Storage,
    student_id: i64,
    today: NaiveDate,
) -> Result<WeeklyAttendanceResponse> {
    let records = storage
        .list_attendance(
            student_id,
            today - chrono::Duration::days(WEEK_WINDOW_DAYS - 1),
            today,
        )
        .await?;
    Ok(WeeklyAttendanceResponse {
        days: aggregate::weekly_slots(&records, today),
        presence_pct: aggregate::presence_pct(&records, today),
    })
}

pub async fn handle_weekly(
    service: &AttendanceService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match weekly_attendance(storage.as_ref(), user.id, AppConfig::get().today()).await {
        Ok(week) => Ok(HttpResponse::Ok().json(ApiResponse::success(week, "获取出勤记录成功"))),
        Err(e) => Ok(internal_error("获取出勤记录失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::entities::AttendanceStatus;
    use crate::models::attendance::responses::SlotStatus;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};

    #[tokio::test]
    async fn test_week_always_has_seven_slots() {
        let storage = memory_storage().await;
        let student = storage
            .register_user(record("maryam", UserRole::Student, None))
            .await
            .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        let empty = weekly_attendance(&storage, student.user.id, today)
            .await
            .unwrap();
        assert_eq!(empty.days.len(), 7);
        assert!(empty.days.iter().all(|d| d.status == SlotStatus::Unmarked));
        assert_eq!(empty.days[6].date, today);

        storage
            .mark_attendance(
                student.user.id,
                today - chrono::Duration::days(2),
                AttendanceStatus::Absent,
            )
            .await
            .unwrap();
        storage.ensure_attendance(student.user.id, today).await.unwrap();
        // 窗口之外的记录不计入
        storage
            .mark_attendance(
                student.user.id,
                today - chrono::Duration::days(9),
                AttendanceStatus::Present,
            )
            .await
            .unwrap();

        let week = weekly_attendance(&storage, student.user.id, today)
            .await
            .unwrap();
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[4].status, SlotStatus::Absent);
        assert_eq!(week.days[6].status, SlotStatus::Present);
    }
}
