use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::tasks::requests::{CreateStudentTaskRequest, CreateTaskRequest};
use crate::models::users::entities::UserRole;
use crate::services::{SubmissionService, TaskService};
use crate::utils::SafeTaskIdI64;

static TASK_SERVICE: Lazy<TaskService> = Lazy::new(TaskService::new_lazy);
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

pub async fn create_task(
    req: HttpRequest,
    task_data: web::Json<CreateTaskRequest>,
) -> ActixResult<HttpResponse> {
    TASK_SERVICE.create_task(task_data.into_inner(), &req).await
}

pub async fn create_student_task(
    req: HttpRequest,
    task_data: web::Json<CreateStudentTaskRequest>,
) -> ActixResult<HttpResponse> {
    TASK_SERVICE
        .create_student_task(task_data.into_inner(), &req)
        .await
}

pub async fn list_my_tasks(req: HttpRequest) -> ActixResult<HttpResponse> {
    TASK_SERVICE.list_my_tasks(&req).await
}

pub async fn submit(
    req: HttpRequest,
    task_id: SafeTaskIdI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.submit(task_id.0, payload, &req).await
}

pub async fn retry(req: HttpRequest, task_id: SafeTaskIdI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.retry(task_id.0, &req).await
}

// 配置路由
pub fn configure_tasks_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/tasks")
            .wrap(middlewares::RequireJWT)
            // 教师布置任务
            .route(
                "",
                web::post()
                    .to(create_task)
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
            )
            .route(
                "/student",
                web::post()
                    .to(create_student_task)
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
            )
            // 学生查看任务与提交录音
            .route(
                "/my",
                web::get()
                    .to(list_my_tasks)
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles())),
            )
            .service(
                web::resource("/{task_id}/submission")
                    .route(
                        web::post()
                            .to(submit)
                            .wrap(middlewares::RateLimit::audio_upload())
                            .wrap(middlewares::RequireRole::new_any(UserRole::student_roles())),
                    )
                    .route(
                        web::delete()
                            .to(retry)
                            .wrap(middlewares::RequireRole::new_any(UserRole::student_roles())),
                    ),
            ),
    );
}
