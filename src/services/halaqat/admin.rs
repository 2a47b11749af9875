use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::HalaqaService;
use crate::errors::HifzError;
use crate::models::halaqat::requests::{
    AssignTeacherRequest, CreateHalaqaRequest, UpdateHalaqaRequest,
};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response, internal_error, not_found};
use crate::utils::validate::{validate_halaqa_name, validate_juz_range};

fn check_fields(name: Option<&str>, juz_from: Option<i32>, juz_to: Option<i32>) -> Result<(), HttpResponse> {
    if let Some(name) = name
        && let Err(msg) = validate_halaqa_name(name)
    {
        return Err(bad_request(ErrorCode::ValidationFailed, msg));
    }
    validate_juz_range(juz_from, juz_to)
        .map_err(|msg| bad_request(ErrorCode::HalaqaJuzRangeInvalid, msg))
}

fn name_conflict(e: &HifzError) -> HttpResponse {
    match e {
        HifzError::Conflict(_) => HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::HalaqaNameAlreadyExists,
            "halaqa 名称已存在",
        )),
        _ => error_response(e, None),
    }
}

pub async fn create_halaqa(
    service: &HalaqaService,
    mut req: CreateHalaqaRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if let Err(resp) = check_fields(Some(&req.name), req.juz_from, req.juz_to) {
        return Ok(resp);
    }
    req.name = req.name.trim().to_string();

    match storage.create_halaqa(req).await {
        Ok(halaqa) => {
            tracing::info!("Halaqa {} created: {}", halaqa.id, halaqa.name);
            Ok(HttpResponse::Created().json(ApiResponse::success(halaqa, "halaqa 创建成功")))
        }
        Err(e) => Ok(name_conflict(&e)),
    }
}

pub async fn update_halaqa(
    service: &HalaqaService,
    halaqa_id: i64,
    mut req: UpdateHalaqaRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if let Err(resp) = check_fields(req.name.as_deref(), req.juz_from, req.juz_to) {
        return Ok(resp);
    }
    req.name = req.name.map(|n| n.trim().to_string());

    match storage.update_halaqa(halaqa_id, req).await {
        Ok(Some(halaqa)) => Ok(HttpResponse::Ok().json(ApiResponse::success(halaqa, "halaqa 更新成功"))),
        Ok(None) => Ok(not_found(ErrorCode::HalaqaNotFound, "halaqa 不存在")),
        Err(e) => Ok(name_conflict(&e)),
    }
}

pub async fn add_teacher(
    service: &HalaqaService,
    halaqa_id: i64,
    req: AssignTeacherRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_halaqa_by_id(halaqa_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found(ErrorCode::HalaqaNotFound, "halaqa 不存在")),
        Err(e) => return Ok(internal_error("查询 halaqa 失败", e)),
    }
    match storage.get_user_by_id(req.teacher_id).await {
        Ok(Some(user)) if user.role == UserRole::Teacher => {}
        Ok(Some(_)) => {
            return Ok(bad_request(ErrorCode::ValidationFailed, "只能指派教师账号"));
        }
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "教师不存在")),
        Err(e) => return Ok(internal_error("查询教师失败", e)),
    }

    match storage.add_halaqa_teacher(halaqa_id, req.teacher_id).await {
        Ok(link) => Ok(HttpResponse::Created().json(ApiResponse::success(link, "教师指派成功"))),
        Err(HifzError::Conflict(_)) => Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::Conflict,
            "该教师已在此 halaqa",
        ))),
        Err(e) => Ok(internal_error("指派教师失败", e)),
    }
}

pub async fn remove_teacher(
    service: &HalaqaService,
    halaqa_id: i64,
    teacher_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.remove_halaqa_teacher(halaqa_id, teacher_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("教师已移除"))),
        Ok(false) => Ok(not_found(ErrorCode::NotFound, "该教师不在此 halaqa")),
        Err(e) => Ok(internal_error("移除教师失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::request_as;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    fn halaqa(name: &str, juz_from: Option<i32>, juz_to: Option<i32>) -> CreateHalaqaRequest {
        CreateHalaqaRequest {
            name: name.into(),
            juz_from,
            juz_to,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_validation_and_conflict() {
        let storage = Arc::new(memory_storage().await);
        let admin = storage
            .register_user(record("admin", UserRole::Admin, None))
            .await
            .unwrap();
        let service = HalaqaService::with_storage(storage);
        let req = request_as(&admin.user);

        let resp = create_halaqa(&service, halaqa("Juz Amma", Some(30), Some(29)), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = create_halaqa(&service, halaqa("Juz Amma", Some(29), Some(30)), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = create_halaqa(&service, halaqa(" Juz Amma ", None, None), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_add_teacher_twice() {
        let storage = Arc::new(memory_storage().await);
        let admin = storage
            .register_user(record("admin", UserRole::Admin, None))
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let created = storage
            .create_halaqa(halaqa("Al-Ikhlas", None, None))
            .await
            .unwrap();
        let service = HalaqaService::with_storage(storage.clone());
        let req = request_as(&admin.user);
        let body = || AssignTeacherRequest {
            teacher_id: teacher.user.id,
        };

        let resp = add_teacher(&service, created.id, body(), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = add_teacher(&service, created.id, body(), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        assert!(
            storage
                .is_halaqa_teacher(created.id, teacher.user.id)
                .await
                .unwrap()
        );
        let resp = remove_teacher(&service, created.id, teacher.user.id, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
