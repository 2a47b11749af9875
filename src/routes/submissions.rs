use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::submissions::requests::{GradeRequest, SubmissionListParams};
use crate::models::users::entities::UserRole;
use crate::services::SubmissionService;
use crate::utils::SafeSubmissionIdI64;

static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

pub async fn list_submissions(
    req: HttpRequest,
    query: web::Query<SubmissionListParams>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_submissions(query.into_inner(), &req)
        .await
}

pub async fn get_detail(
    req: HttpRequest,
    submission_id: SafeSubmissionIdI64,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.get_detail(submission_id.0, &req).await
}

pub async fn grade(
    req: HttpRequest,
    submission_id: SafeSubmissionIdI64,
    grade_data: web::Json<GradeRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .grade(submission_id.0, grade_data.into_inner(), &req)
        .await
}

pub async fn download_audio(
    req: HttpRequest,
    submission_id: SafeSubmissionIdI64,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .download_audio(submission_id.0, &req)
        .await
}

// 配置路由
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            .route(
                "",
                web::get()
                    .to(list_submissions)
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
            )
            .route(
                "/{submission_id}",
                web::get()
                    .to(get_detail)
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
            )
            .route(
                "/{submission_id}/grade",
                web::post()
                    .to(grade)
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
            )
            // 学生本人、该 halaqa 教师或管理员，在 service 内判断
            .route("/{submission_id}/audio", web::get().to(download_audio)),
    );
}
