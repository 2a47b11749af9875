use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::halaqat::requests::{
    AssignTeacherRequest, CreateHalaqaRequest, MarkAttendanceRequest, UpdateHalaqaRequest,
};
use crate::models::notifications::requests::BroadcastRequest;
use crate::models::tasks::requests::TaskListParams;
use crate::models::users::entities::UserRole;
use crate::services::HalaqaService;
use crate::utils::{SafeHalaqaIdI64, SafeStudentIdI64, SafeTeacherIdI64};

static HALAQA_SERVICE: Lazy<HalaqaService> = Lazy::new(HalaqaService::new_lazy);

pub async fn list_options(req: HttpRequest) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE.list_options(&req).await
}

pub async fn list_halaqat(req: HttpRequest) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE.list_halaqat(&req).await
}

pub async fn create_halaqa(
    req: HttpRequest,
    halaqa_data: web::Json<CreateHalaqaRequest>,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .create_halaqa(halaqa_data.into_inner(), &req)
        .await
}

pub async fn update_halaqa(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
    update_data: web::Json<UpdateHalaqaRequest>,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .update_halaqa(halaqa_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn add_teacher(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
    teacher_data: web::Json<AssignTeacherRequest>,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .add_teacher(halaqa_id.0, teacher_data.into_inner(), &req)
        .await
}

pub async fn remove_teacher(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
    teacher_id: SafeTeacherIdI64,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .remove_teacher(halaqa_id.0, teacher_id.0, &req)
        .await
}

pub async fn get_detail(req: HttpRequest, halaqa_id: SafeHalaqaIdI64) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE.get_detail(halaqa_id.0, &req).await
}

pub async fn eligible_surahs(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE.eligible_surahs(halaqa_id.0, &req).await
}

pub async fn list_tasks(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
    query: web::Query<TaskListParams>,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .list_tasks(halaqa_id.0, query.into_inner(), &req)
        .await
}

pub async fn broadcast(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
    message: web::Json<BroadcastRequest>,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .broadcast(halaqa_id.0, message.into_inner(), &req)
        .await
}

pub async fn mark_attendance(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
    attendance: web::Json<MarkAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .mark_attendance(halaqa_id.0, attendance.into_inner(), &req)
        .await
}

pub async fn unassign_student(
    req: HttpRequest,
    halaqa_id: SafeHalaqaIdI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    HALAQA_SERVICE
        .unassign_student(halaqa_id.0, student_id.0, &req)
        .await
}

// 配置路由
pub fn configure_halaqat_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/halaqat")
            // 注册页使用，无需登录
            .route("/options", web::get().to(list_options))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .service(
                        web::resource("")
                            // 教师看到自己的 halaqa，管理员看到全部
                            .route(
                                web::get()
                                    .to(list_halaqat)
                                    .wrap(middlewares::RequireRole::new_any(
                                        UserRole::teacher_roles(),
                                    )),
                            )
                            .route(
                                web::post()
                                    .to(create_halaqa)
                                    .wrap(middlewares::RequireRole::new_any(
                                        UserRole::admin_roles(),
                                    )),
                            ),
                    )
                    .service(
                        web::scope("/{halaqa_id}")
                            .service(
                                web::resource("")
                                    .route(
                                        web::get()
                                            .to(get_detail)
                                            .wrap(middlewares::RequireHalaqaTeacher),
                                    )
                                    .route(web::put().to(update_halaqa).wrap(
                                        middlewares::RequireRole::new_any(UserRole::admin_roles()),
                                    )),
                            )
                            // 管理员分配教师
                            .service(
                                web::scope("/teachers")
                                    .wrap(middlewares::RequireRole::new_any(
                                        UserRole::admin_roles(),
                                    ))
                                    .route("", web::post().to(add_teacher))
                                    .route("/{teacher_id}", web::delete().to(remove_teacher)),
                            )
                            // 以下均要求当前用户为该 halaqa 的教师
                            .service(
                                web::scope("")
                                    .wrap(middlewares::RequireHalaqaTeacher)
                                    .route("/surahs", web::get().to(eligible_surahs))
                                    .route("/tasks", web::get().to(list_tasks))
                                    .service(
                                        web::resource("/notifications")
                                            .wrap(middlewares::RateLimit::broadcast())
                                            .route(web::post().to(broadcast)),
                                    )
                                    .route("/attendance", web::put().to(mark_attendance))
                                    .route(
                                        "/students/{student_id}/unassign",
                                        web::post().to(unassign_student),
                                    ),
                            ),
                    ),
            ),
    );
}
