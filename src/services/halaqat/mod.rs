pub mod admin;
pub mod broadcast;
pub mod detail;
pub mod list;
pub mod roster;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::middlewares::RequireHalaqaTeacher;
use crate::models::ErrorCode;
use crate::models::halaqat::entities::Halaqa;
use crate::models::halaqat::requests::{
    AssignTeacherRequest, CreateHalaqaRequest, MarkAttendanceRequest, UpdateHalaqaRequest,
};
use crate::models::notifications::requests::BroadcastRequest;
use crate::models::tasks::requests::TaskListParams;
use crate::storage::Storage;

use super::{internal_error, not_found};

pub struct HalaqaService {
    storage: Option<Arc<dyn Storage>>,
}

/// 路由上的 halaqa：优先取中间件已加载的，否则查库
pub(crate) async fn resolve_halaqa(
    storage: &dyn Storage,
    request: &HttpRequest,
    halaqa_id: i64,
) -> Result<Halaqa, HttpResponse> {
    if let Some(halaqa) = RequireHalaqaTeacher::extract_halaqa(request)
        && halaqa.id == halaqa_id
    {
        return Ok(halaqa);
    }
    match storage.get_halaqa_by_id(halaqa_id).await {
        Ok(Some(halaqa)) => Ok(halaqa),
        Ok(None) => Err(not_found(ErrorCode::HalaqaNotFound, "halaqa 不存在")),
        Err(e) => Err(internal_error("查询 halaqa 失败", e)),
    }
}

impl HalaqaService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    #[cfg(test)]
    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::resolve_storage(&self.storage, request)
    }

    // 注册页选项（公开）
    pub async fn list_options(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_options(self, request).await
    }

    // 教师看到自己的 halaqa，管理员看到全部
    pub async fn list_halaqat(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_halaqat(self, request).await
    }

    pub async fn create_halaqa(
        &self,
        req: CreateHalaqaRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        admin::create_halaqa(self, req, request).await
    }

    pub async fn update_halaqa(
        &self,
        halaqa_id: i64,
        req: UpdateHalaqaRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        admin::update_halaqa(self, halaqa_id, req, request).await
    }

    pub async fn add_teacher(
        &self,
        halaqa_id: i64,
        req: AssignTeacherRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        admin::add_teacher(self, halaqa_id, req, request).await
    }

    pub async fn remove_teacher(
        &self,
        halaqa_id: i64,
        teacher_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        admin::remove_teacher(self, halaqa_id, teacher_id, request).await
    }

    // halaqa 详情与统计
    pub async fn get_detail(
        &self,
        halaqa_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        detail::get_detail(self, halaqa_id, request).await
    }

    pub async fn eligible_surahs(
        &self,
        halaqa_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        detail::eligible_surahs(self, halaqa_id, request).await
    }

    pub async fn list_tasks(
        &self,
        halaqa_id: i64,
        params: TaskListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        detail::list_tasks(self, halaqa_id, params, request).await
    }

    pub async fn broadcast(
        &self,
        halaqa_id: i64,
        req: BroadcastRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        broadcast::broadcast(self, halaqa_id, req, request).await
    }

    pub async fn mark_attendance(
        &self,
        halaqa_id: i64,
        req: MarkAttendanceRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        roster::mark_attendance(self, halaqa_id, req, request).await
    }

    pub async fn unassign_student(
        &self,
        halaqa_id: i64,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        roster::unassign_student(self, halaqa_id, student_id, request).await
    }
}
