/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <access token>`，把当前用户写入请求扩展。
 *
 * ```rust,ignore
 * web::scope("/api/v1/tasks")
 *     .wrap(RequireJWT)
 *     .route("/my", web::get().to(list_my_tasks))
 * ```
 *
 * 处理函数里通过 `RequireJWT::extract_user(&req)` 取用户。
 * 用户记录按 ID 缓存 `cache.default_ttl` 秒，账号状态变化时由业务层调用
 * `RequireJWT::forget_user` 失效。
 */

use crate::cache::{self, ObjectCache};
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole, UserStatus};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败原因
enum AuthFailure {
    Unauthorized(&'static str),
    Disabled,
    Internal,
}

async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthFailure::Unauthorized("缺少或无效的 Authorization 头"))?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        AuthFailure::Unauthorized("无效或已过期的 token")
    })?;
    let user_id = claims
        .user_id()
        .map_err(|_| AuthFailure::Unauthorized("token 中的用户 ID 无效"))?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Cache not registered in app data");
            AuthFailure::Internal
        })?;

    let user = match cache::get_json::<User>(cache.as_ref(), &cache::user_key(user_id)).await {
        Some(user) => user,
        None => {
            let storage = req
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .map(|data| data.get_ref().clone())
                .ok_or_else(|| {
                    error!("Storage not registered in app data");
                    AuthFailure::Internal
                })?;

            let user = storage
                .get_user_by_id(user_id)
                .await
                .map_err(|e| {
                    error!("Failed to load user {} for authentication: {}", user_id, e);
                    AuthFailure::Internal
                })?
                .ok_or(AuthFailure::Unauthorized("用户不存在"))?;

            cache::put_json(cache.as_ref(), cache::user_key(user_id), &user, 0).await;
            user
        }
    };

    if user.status != UserStatus::Active {
        return Err(AuthFailure::Disabled);
    }

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            let response = match authenticate(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    return Ok(srv.call(req).await?.map_into_left_body());
                }
                Err(AuthFailure::Unauthorized(msg)) => {
                    info!("JWT authentication failed for {}: {}", req.path(), msg);
                    create_error_response(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg)
                }
                Err(AuthFailure::Disabled) => create_error_response(
                    StatusCode::FORBIDDEN,
                    ErrorCode::AccountDisabled,
                    "账号未激活或已停用",
                ),
                Err(AuthFailure::Internal) => create_error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "服务器内部错误",
                ),
            };
            Ok(req.into_response(response.map_into_right_body()))
        })
    }
}

impl RequireJWT {
    /// 当前登录用户，只能在 RequireJWT 保护的路由中使用
    pub fn extract_user(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role)
    }

    /// 账号状态或资料变化后丢弃缓存的用户记录
    pub async fn forget_user(cache: &dyn ObjectCache, user_id: i64) {
        cache.remove(&cache::user_key(user_id)).await;
    }
}
