use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::{HalaqaService, resolve_halaqa};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::dashboard::responses::{HalaqaDetailResponse, TeacherBrief};
use crate::models::halaqat::entities::Halaqa;
use crate::models::halaqat::responses::{EligibleSurah, EligibleSurahsResponse};
use crate::models::tasks::requests::TaskListParams;
use crate::models::tasks::responses::{TaskItem, TaskListResponse};
use crate::services::dashboard::{aggregate, surah_names};
use crate::services::internal_error;
use crate::storage::Storage;

pub(crate) async fn build_detail(storage: &dyn Storage, halaqa: Halaqa) -> Result<HalaqaDetailResponse> {
    let teacher_ids = storage.list_halaqa_teacher_ids(halaqa.id).await?;
    let teachers = storage
        .list_users_with_profiles_by_ids(&teacher_ids)
        .await?
        .into_iter()
        .map(|t| TeacherBrief {
            id: t.user.id,
            name: t.user.name().to_string(),
        })
        .collect();

    let students = storage.list_halaqa_students(halaqa.id).await?;
    let tasks = storage.list_halaqa_tasks(&[halaqa.id], None).await?;
    let task_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    let submissions = storage.list_task_submissions(&task_ids).await?;

    let rows = aggregate::student_rows(&students, &tasks, &submissions, Utc::now());
    let summary = aggregate::halaqa_summary(halaqa, students.len() as i64, &tasks, &submissions);

    Ok(HalaqaDetailResponse {
        summary,
        teachers,
        students: rows,
    })
}

pub async fn get_detail(
    service: &HalaqaService,
    halaqa_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let halaqa = match resolve_halaqa(storage.as_ref(), request, halaqa_id).await {
        Ok(halaqa) => halaqa,
        Err(resp) => return Ok(resp),
    };

    match build_detail(storage.as_ref(), halaqa).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail, "获取 halaqa 详情成功"))),
        Err(e) => Ok(internal_error("获取 halaqa 详情失败", e)),
    }
}

/// juz 范围与 halaqa 有交集的 surah
pub async fn eligible_surahs(
    service: &HalaqaService,
    halaqa_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let halaqa = match resolve_halaqa(storage.as_ref(), request, halaqa_id).await {
        Ok(halaqa) => halaqa,
        Err(resp) => return Ok(resp),
    };

    match storage.list_surahs().await {
        Ok(all) => {
            let surahs: Vec<EligibleSurah> = all
                .into_iter()
                .filter(|s| s.eligible_for(halaqa.juz_from, halaqa.juz_to))
                .map(EligibleSurah::from)
                .collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                EligibleSurahsResponse { surahs },
                "获取可选 surah 成功",
            )))
        }
        Err(e) => Ok(internal_error("查询 surah 失败", e)),
    }
}

pub async fn list_tasks(
    service: &HalaqaService,
    halaqa_id: i64,
    params: TaskListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let halaqa = match resolve_halaqa(storage.as_ref(), request, halaqa_id).await {
        Ok(halaqa) => halaqa,
        Err(resp) => return Ok(resp),
    };

    let tasks = match storage.list_halaqa_tasks(&[halaqa.id], params.kind).await {
        Ok(tasks) => tasks,
        Err(e) => return Ok(internal_error("获取任务列表失败", e)),
    };
    let names = match surah_names(storage.as_ref()).await {
        Ok(names) => names,
        Err(e) => return Ok(internal_error("查询 surah 失败", e)),
    };

    let items = tasks
        .into_iter()
        .map(|task| {
            let surah_name = names.get(&task.surah_id).cloned().unwrap_or_default();
            TaskItem {
                title: task.title(&surah_name),
                surah_name,
                task,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        TaskListResponse { items },
        "获取任务列表成功",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_eligible_surahs_follow_juz_range() {
        let storage = Arc::new(memory_storage().await);
        storage.seed_surahs().await.unwrap();
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Juz Amma".into(),
                juz_from: Some(30),
                juz_to: Some(30),
                description: None,
            })
            .await
            .unwrap();
        let service = HalaqaService::with_storage(storage);

        let resp = eligible_surahs(&service, halaqa.id, &request_as(&teacher.user))
            .await
            .unwrap();
        let body = body_json(resp).await;
        let surahs = body["data"]["surahs"].as_array().unwrap();
        // An-Naba (78) 到 An-Nas (114)
        assert_eq!(surahs.len(), 37);
        assert_eq!(surahs[0]["id"], 78);
        assert!(surahs.iter().all(|s| s["id"] != 2));
    }

    #[tokio::test]
    async fn test_unknown_halaqa() {
        let storage = Arc::new(memory_storage().await);
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let service = HalaqaService::with_storage(storage);
        let resp = get_detail(&service, 404, &request_as(&teacher.user))
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
