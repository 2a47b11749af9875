/*!
 * halaqa 教师访问控制中间件
 *
 * 放在 RequireJWT 之后，作用于带 `{halaqa_id}` 路径参数的路由：
 * halaqa 不存在返回 404，当前用户不是该 halaqa 的教师返回 403，管理员直接放行。
 * 通过后把 `Halaqa` 写入请求扩展，处理函数可用 `RequireHalaqaTeacher::extract_halaqa` 读取。
 */

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
use tracing::{debug, error};

use crate::{
    models::{
        ErrorCode,
        halaqat::entities::Halaqa,
        users::entities::{User, UserRole},
    },
    storage::Storage,
};

use super::create_error_response;

#[derive(Clone, Default)]
pub struct RequireHalaqaTeacher;

impl<S, B> Transform<S, ServiceRequest> for RequireHalaqaTeacher
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireHalaqaTeacherMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireHalaqaTeacherMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireHalaqaTeacherMiddleware<S> {
    service: Rc<S>,
}

enum Denied {
    Unauthenticated,
    BadPath,
    HalaqaMissing,
    NotTeacher,
    Internal,
}

impl Denied {
    fn into_parts(self) -> (StatusCode, ErrorCode, &'static str) {
        match self {
            Denied::Unauthenticated => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, "需要登录"),
            Denied::BadPath => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, "无效的 halaqa_id"),
            Denied::HalaqaMissing => (StatusCode::NOT_FOUND, ErrorCode::HalaqaNotFound, "halaqa 不存在"),
            Denied::NotTeacher => (
                StatusCode::FORBIDDEN,
                ErrorCode::HalaqaPermissionDenied,
                "你不是该 halaqa 的教师",
            ),
            Denied::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "服务器内部错误",
            ),
        }
    }
}

async fn authorize(req: &ServiceRequest) -> Result<Halaqa, Denied> {
    let user = req
        .extensions()
        .get::<User>()
        .map(|u| (u.id, u.role))
        .ok_or(Denied::Unauthenticated)?;

    let halaqa_id = req
        .match_info()
        .get("halaqa_id")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(Denied::BadPath)?;

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not registered in app data");
            Denied::Internal
        })?;

    let halaqa = storage
        .get_halaqa_by_id(halaqa_id)
        .await
        .map_err(|e| {
            error!("Failed to load halaqa {}: {}", halaqa_id, e);
            Denied::Internal
        })?
        .ok_or(Denied::HalaqaMissing)?;

    match user {
        (_, UserRole::Admin) => Ok(halaqa),
        (user_id, UserRole::Teacher) => {
            let assigned = storage
                .is_halaqa_teacher(halaqa_id, user_id)
                .await
                .map_err(|e| {
                    error!("Failed to check halaqa teacher: {}", e);
                    Denied::Internal
                })?;
            if assigned {
                Ok(halaqa)
            } else {
                Err(Denied::NotTeacher)
            }
        }
        _ => Err(Denied::NotTeacher),
    }
}

impl<S, B> Service<ServiceRequest> for RequireHalaqaTeacherMiddleware<S>
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
            match authorize(&req).await {
                Ok(halaqa) => {
                    debug!("Halaqa {} access granted", halaqa.id);
                    req.extensions_mut().insert(halaqa);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(denied) => {
                    let (status, code, message) = denied.into_parts();
                    Ok(req.into_response(
                        create_error_response(status, code, message).map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireHalaqaTeacher {
    pub fn extract_halaqa(req: &actix_web::HttpRequest) -> Option<Halaqa> {
        req.extensions().get::<Halaqa>().cloned()
    }
}
