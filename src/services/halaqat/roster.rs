use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::HalaqaService;
use crate::config::AppConfig;
use crate::middlewares::RequireJWT;
use crate::models::halaqat::requests::MarkAttendanceRequest;
use crate::models::users::entities::UserRole;
use crate::models::users::responses::UserWithProfile;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{forbidden, internal_error, not_found, resolve_cache};
use crate::storage::Storage;

/// 找到属于该 halaqa 的学生；学生不存在为 404，在别的 halaqa 为 403
async fn member_of(
    storage: &dyn Storage,
    halaqa_id: i64,
    student_id: i64,
) -> Result<UserWithProfile, HttpResponse> {
    let student = match storage.get_user_with_profile(student_id).await {
        Ok(Some(found)) if found.user.role == UserRole::Student => found,
        Ok(_) => return Err(not_found(ErrorCode::UserNotFound, "学生不存在")),
        Err(e) => return Err(internal_error("查询学生失败", e)),
    };
    let in_halaqa = student
        .profile
        .as_ref()
        .is_some_and(|p| p.halaqa_id == Some(halaqa_id));
    if !in_halaqa {
        return Err(forbidden(
            ErrorCode::StudentNotInHalaqa,
            "该学生不在此 halaqa",
        ));
    }
    Ok(student)
}

pub async fn mark_attendance(
    service: &HalaqaService,
    halaqa_id: i64,
    req: MarkAttendanceRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    if let Err(resp) = member_of(storage.as_ref(), halaqa_id, req.student_id).await {
        return Ok(resp);
    }

    let date = req.date.unwrap_or_else(|| AppConfig::get().today());
    match storage.mark_attendance(req.student_id, date, req.status).await {
        Ok(record) => Ok(HttpResponse::Ok().json(ApiResponse::success(record, "出勤已记录"))),
        Err(e) => Ok(internal_error("记录出勤失败", e)),
    }
}

/// 把学生移出 halaqa，同时清空加入时间
pub async fn unassign_student(
    service: &HalaqaService,
    halaqa_id: i64,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    if let Err(resp) = member_of(storage.as_ref(), halaqa_id, student_id).await {
        return Ok(resp);
    }

    match storage.set_student_halaqa(student_id, None).await {
        Ok(_) => {
            if let Some(cache) = resolve_cache(request) {
                RequireJWT::forget_user(cache.as_ref(), student_id).await;
            }
            tracing::info!("Student {} removed from halaqa {}", student_id, halaqa_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("学生已移出 halaqa")))
        }
        Err(e) => Ok(internal_error("移出学生失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::entities::AttendanceStatus;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::services::test_support::request_as;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use actix_web::http::StatusCode;
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn two_halaqat(storage: &dyn Storage) -> (i64, i64) {
        let mut ids = Vec::new();
        for name in ["Halaqa Al-Fath", "Halaqa Al-Kahf"] {
            let h = storage
                .create_halaqa(CreateHalaqaRequest {
                    name: name.into(),
                    juz_from: None,
                    juz_to: None,
                    description: None,
                })
                .await
                .unwrap();
            ids.push(h.id);
        }
        (ids[0], ids[1])
    }

    #[tokio::test]
    async fn test_unassign_checks_membership() {
        let storage = Arc::new(memory_storage().await);
        let (mine, other) = two_halaqat(storage.as_ref()).await;
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let hamza = storage
            .register_user(record("hamza", UserRole::Student, Some(other)))
            .await
            .unwrap();
        let service = HalaqaService::with_storage(storage.clone());
        let req = request_as(&teacher.user);

        let resp = unassign_student(&service, mine, hamza.user.id, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = unassign_student(&service, mine, 9999, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = unassign_student(&service, other, hamza.user.id, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let profile = storage
            .get_user_with_profile(hamza.user.id)
            .await
            .unwrap()
            .unwrap()
            .profile
            .unwrap();
        assert!(profile.halaqa_id.is_none());
        assert!(profile.halaqa_joined_at.is_none());
    }

    #[tokio::test]
    async fn test_mark_attendance_upserts() {
        let storage = Arc::new(memory_storage().await);
        let (mine, _) = two_halaqat(storage.as_ref()).await;
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let aisha = storage
            .register_user(record("aisha", UserRole::Student, Some(mine)))
            .await
            .unwrap();
        let service = HalaqaService::with_storage(storage.clone());
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();

        for status in [AttendanceStatus::Present, AttendanceStatus::Late] {
            let resp = mark_attendance(
                &service,
                mine,
                MarkAttendanceRequest {
                    student_id: aisha.user.id,
                    date: Some(day),
                    status,
                },
                &request_as(&teacher.user),
            )
            .await
            .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let records = storage.list_attendance(aisha.user.id, day, day).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Late);
    }
}
