use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TaskService;
use crate::models::surahs::entities::Surah;
use crate::models::tasks::requests::{CreateStudentTaskRequest, CreateTaskRequest, NewTaskRecord};
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, forbidden, internal_error, not_found};
use crate::storage::Storage;

/// ayah 范围校验，错误消息指明出错的字段
pub(crate) fn check_ayah_range(surah: &Surah, start_ayah: i32, end_ayah: i32) -> Result<(), String> {
    if surah.contains_range(start_ayah, end_ayah) {
        return Ok(());
    }
    if start_ayah < 1 {
        return Err("start_ayah 必须大于等于 1".to_string());
    }
    if start_ayah > end_ayah {
        return Err("start_ayah 不能大于 end_ayah".to_string());
    }
    if end_ayah > surah.ayah_count {
        return Err(format!(
            "end_ayah 超出范围，{} 共 {} 个 ayah",
            surah.name, surah.ayah_count
        ));
    }
    Err("ayah 范围无效".to_string())
}

/// 教师必须在该 halaqa 任教，halaqa 不存在同样视为无权限
async fn check_teaches(
    storage: &dyn Storage,
    teacher: &User,
    halaqa_id: i64,
) -> Result<(), HttpResponse> {
    let denied = || forbidden(ErrorCode::TaskPermissionDenied, "您不是该 halaqa 的教师");
    match storage.get_halaqa_by_id(halaqa_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(denied()),
        Err(e) => return Err(internal_error("查询 halaqa 失败", e)),
    }
    if teacher.role == UserRole::Admin {
        return Ok(());
    }
    match storage.is_halaqa_teacher(halaqa_id, teacher.id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(denied()),
        Err(e) => Err(internal_error("校验 halaqa 教师失败", e)),
    }
}

async fn load_surah(storage: &dyn Storage, surah_id: i32) -> Result<Surah, HttpResponse> {
    match storage.get_surah_by_id(surah_id).await {
        Ok(Some(surah)) => Ok(surah),
        Ok(None) => Err(not_found(ErrorCode::SurahNotFound, "surah 不存在")),
        Err(e) => Err(internal_error("查询 surah 失败", e)),
    }
}

/// 校验后写入任务
async fn insert_task(
    storage: &dyn Storage,
    teacher: &User,
    record: NewTaskRecord,
) -> ActixResult<HttpResponse> {
    if let Err(resp) = check_teaches(storage, teacher, record.halaqa_id).await {
        return Ok(resp);
    }
    let surah = match load_surah(storage, record.surah_id).await {
        Ok(surah) => surah,
        Err(resp) => return Ok(resp),
    };
    if let Err(msg) = check_ayah_range(&surah, record.start_ayah, record.end_ayah) {
        return Ok(bad_request(ErrorCode::AyahRangeInvalid, msg));
    }

    match storage.create_task(record).await {
        Ok(task) => {
            tracing::info!(
                "Task {} ({}) created in halaqa {} by {}",
                task.id,
                task.kind,
                task.halaqa_id,
                teacher.id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(task, "任务创建成功")))
        }
        Err(e) => Ok(internal_error("创建任务失败", e)),
    }
}

pub async fn create_task(
    service: &TaskService,
    req: CreateTaskRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let teacher = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let record = NewTaskRecord {
        halaqa_id: req.halaqa_id,
        created_by: teacher.id,
        kind: req.kind,
        surah_id: req.surah_id,
        start_ayah: req.start_ayah,
        end_ayah: req.end_ayah,
        deadline: req.deadline,
        student_id: None,
    };
    insert_task(storage.as_ref(), &teacher, record).await
}

pub async fn create_student_task(
    service: &TaskService,
    req: CreateStudentTaskRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let teacher = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 任务归属学生当前所在的 halaqa
    let halaqa_id = match storage.get_user_with_profile(req.student_id).await {
        Ok(Some(student)) if student.user.role == UserRole::Student => {
            match student.profile.and_then(|p| p.halaqa_id) {
                Some(id) => id,
                None => {
                    return Ok(bad_request(
                        ErrorCode::StudentNotInHalaqa,
                        "该学生尚未加入 halaqa",
                    ));
                }
            }
        }
        Ok(_) => return Ok(not_found(ErrorCode::UserNotFound, "学生不存在")),
        Err(e) => return Ok(internal_error("查询学生失败", e)),
    };

    let record = NewTaskRecord {
        halaqa_id,
        created_by: teacher.id,
        kind: req.kind,
        surah_id: req.surah_id,
        start_ayah: req.start_ayah,
        end_ayah: req.end_ayah,
        deadline: req.deadline,
        student_id: Some(req.student_id),
    };
    insert_task(storage.as_ref(), &teacher, record).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::tasks::entities::TaskKind;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::sea_orm_storage::test_support::{memory_storage, record};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    fn fatiha() -> Surah {
        Surah {
            id: 1,
            name: "الفاتحة".into(),
            ayah_count: 7,
            juz_from: 1,
            juz_to: 1,
        }
    }

    #[test]
    fn test_range_messages_name_field() {
        assert!(check_ayah_range(&fatiha(), 1, 7).is_ok());
        assert!(check_ayah_range(&fatiha(), 7, 7).is_ok());
        assert!(check_ayah_range(&fatiha(), 0, 3).unwrap_err().contains("start_ayah"));
        assert!(check_ayah_range(&fatiha(), 5, 3).unwrap_err().contains("start_ayah"));
        assert!(check_ayah_range(&fatiha(), 1, 8).unwrap_err().contains("end_ayah"));
    }

    fn baqarah(halaqa_id: i64, start_ayah: i32, end_ayah: i32) -> CreateTaskRequest {
        CreateTaskRequest {
            halaqa_id,
            kind: TaskKind::Recitation,
            surah_id: 2,
            start_ayah,
            end_ayah,
            deadline: None,
        }
    }

    #[tokio::test]
    async fn test_create_task_permissions() {
        let storage = Arc::new(memory_storage().await);
        storage.seed_surahs().await.unwrap();
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Al-Furqan".into(),
                juz_from: Some(1),
                juz_to: Some(2),
                description: None,
            })
            .await
            .unwrap();
        let assigned = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        let outsider = storage
            .register_user(record("guest", UserRole::Teacher, None))
            .await
            .unwrap();
        storage
            .add_halaqa_teacher(halaqa.id, assigned.user.id)
            .await
            .unwrap();
        let service = TaskService::with_storage(storage);

        let resp = create_task(&service, baqarah(halaqa.id, 1, 5), &request_as(&outsider.user))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = create_task(&service, baqarah(999, 1, 5), &request_as(&assigned.user))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = create_task(&service, baqarah(halaqa.id, 5, 1), &request_as(&assigned.user))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = create_task(&service, baqarah(halaqa.id, 1, 5), &request_as(&assigned.user))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["created_by"], assigned.user.id);
        assert_eq!(body["data"]["kind"], "recitation");
    }

    #[tokio::test]
    async fn test_student_task_targets_student() {
        let storage = Arc::new(memory_storage().await);
        storage.seed_surahs().await.unwrap();
        let halaqa = storage
            .create_halaqa(CreateHalaqaRequest {
                name: "Halaqa Al-Muminun".into(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        let teacher = storage
            .register_user(record("ustadh", UserRole::Teacher, None))
            .await
            .unwrap();
        storage.add_halaqa_teacher(halaqa.id, teacher.user.id).await.unwrap();
        let student = storage
            .register_user(record("sumayya", UserRole::Student, Some(halaqa.id)))
            .await
            .unwrap();
        let service = TaskService::with_storage(storage);

        let resp = create_student_task(
            &service,
            CreateStudentTaskRequest {
                student_id: student.user.id,
                kind: TaskKind::Review,
                surah_id: 112,
                start_ayah: 1,
                end_ayah: 4,
                deadline: None,
            },
            &request_as(&teacher.user),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["student_id"], student.user.id);
        assert_eq!(body["data"]["halaqa_id"], halaqa.id);
    }
}
