use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::HalaqaService;
use crate::models::ApiResponse;
use crate::models::halaqat::responses::{HalaqaListItem, HalaqaListResponse, HalaqaOption};
use crate::models::users::entities::UserRole;
use crate::services::{current_user, internal_error};

pub async fn list_options(
    service: &HalaqaService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_halaqat().await {
        Ok(halaqat) => {
            let options: Vec<HalaqaOption> = halaqat
                .into_iter()
                .map(|h| HalaqaOption {
                    id: h.id,
                    name: h.name,
                })
                .collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(options, "获取 halaqa 选项成功")))
        }
        Err(e) => Ok(internal_error("获取 halaqa 选项失败", e)),
    }
}

pub async fn list_halaqat(
    service: &HalaqaService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let halaqat = if user.role == UserRole::Admin {
        storage.list_halaqat().await
    } else {
        storage.list_teacher_halaqat(user.id).await
    };
    let halaqat = match halaqat {
        Ok(halaqat) => halaqat,
        Err(e) => return Ok(internal_error("获取 halaqa 列表失败", e)),
    };
    let counts = match storage.count_students_by_halaqa().await {
        Ok(counts) => counts,
        Err(e) => return Ok(internal_error("统计 halaqa 学生数失败", e)),
    };

    let mut items = Vec::with_capacity(halaqat.len());
    for halaqa in halaqat {
        let teacher_ids = match storage.list_halaqa_teacher_ids(halaqa.id).await {
            Ok(ids) => ids,
            Err(e) => return Ok(internal_error("查询 halaqa 教师失败", e)),
        };
        items.push(HalaqaListItem {
            student_count: counts.get(&halaqa.id).copied().unwrap_or(0),
            teacher_ids,
            halaqa,
        });
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        HalaqaListResponse { items },
        "获取 halaqa 列表成功",
    )))
}
