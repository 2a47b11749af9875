use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{
    AssignHalaqaRequest, UpdateTeacherStatusRequest, UpdateUserStatusRequest, UserListParams,
};
use crate::services::UserService;
use crate::utils::SafeIDI64;

// 懒加载的全局 UserService 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

// HTTP处理程序
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn update_teacher_status(
    req: HttpRequest,
    user_id: SafeIDI64,
    update_data: web::Json<UpdateTeacherStatusRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_teacher_status(user_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn update_user_status(
    req: HttpRequest,
    user_id: SafeIDI64,
    update_data: web::Json<UpdateUserStatusRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_user_status(user_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn assign_halaqa(
    req: HttpRequest,
    user_id: SafeIDI64,
    assign_data: web::Json<AssignHalaqaRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .assign_halaqa(user_id.0, assign_data.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_users))
            .route("/{id}/teacher-status", web::put().to(update_teacher_status))
            .route("/{id}/status", web::put().to(update_user_status))
            .route("/{id}/halaqa", web::put().to(assign_halaqa)),
    );
}
