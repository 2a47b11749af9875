use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::TaskService;
use crate::models::tasks::responses::StudentTaskListResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::dashboard::load_student_views;
use crate::services::{current_user, internal_error, not_found};

/// 学生可见的任务，新的在前
pub async fn list_my_tasks(
    service: &TaskService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let student = match storage.get_user_with_profile(user.id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(internal_error("查询学生失败", e)),
    };

    match load_student_views(storage.as_ref(), &student, Utc::now()).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            StudentTaskListResponse { items },
            "获取任务列表成功",
        ))),
        Err(e) => Ok(internal_error("获取任务列表失败", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::tasks::entities::TaskKind;
    use crate::models::tasks::requests::NewTaskRecord;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_tasks_before_joining_hidden() {
        let storage = Arc::new(memory_storage().await);
        storage.seed_surahs().await.unwrap();
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Al-Mulk".into(),
                juz_from: Some(29),
                juz_to: Some(29),
                description: None,
            })
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let task = |student_id: Option<i64>| NewTaskRecord {
            halaqa_id: halaqa.id,
            created_by: teacher.user.id,
            kind: TaskKind::Recitation,
            surah_id: 67,
            start_ayah: 1,
            end_ayah: 10,
            deadline: None,
            student_id,
        };
        let early = storage.create_task(task(None)).await.unwrap();

        // 加入时间晚于第一个任务
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let student = storage
            .register_user(record("anas", UserRole::Student, Some(halaqa.id)))
            .await
            .unwrap();
        let other = storage
            .register_user(record("talha", UserRole::Student, Some(halaqa.id)))
            .await
            .unwrap();
        let shared = storage.create_task(task(None)).await.unwrap();
        storage.create_task(task(Some(other.user.id))).await.unwrap();
        let service = TaskService::with_storage(storage);

        let resp = list_my_tasks(&service, &request_as(&student.user)).await.unwrap();
        let body = body_json(resp).await;
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["task"]["id"], shared.id);
        assert_ne!(items[0]["task"]["id"], early.id);
        assert_eq!(items[0]["title"], "الملك 1-10");
    }
}
