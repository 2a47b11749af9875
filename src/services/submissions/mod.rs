pub mod audio;
pub mod review;
pub mod submit;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::ErrorCode;
use crate::models::submissions::entities::Submission;
use crate::models::submissions::requests::{GradeRequest, SubmissionListParams};
use crate::models::tasks::entities::Task;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

use super::{forbidden, internal_error, not_found};

pub struct SubmissionService {
    storage: Option<Arc<dyn Storage>>,
}

/// 提交及其所属任务
pub(crate) async fn load_with_task(
    storage: &dyn Storage,
    submission_id: i64,
) -> Result<(Submission, Task), HttpResponse> {
    let submission = match storage.get_submission_by_id(submission_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return Err(not_found(ErrorCode::SubmissionNotFound, "提交不存在")),
        Err(e) => return Err(internal_error("查询提交失败", e)),
    };
    match storage.get_task_by_id(submission.task_id).await {
        Ok(Some(task)) => Ok((submission, task)),
        Ok(None) => Err(not_found(ErrorCode::TaskNotFound, "任务不存在")),
        Err(e) => Err(internal_error("查询任务失败", e)),
    }
}

/// 管理员或该 halaqa 的教师
pub(crate) async fn ensure_halaqa_teacher(
    storage: &dyn Storage,
    user: &User,
    halaqa_id: i64,
) -> Result<(), HttpResponse> {
    if user.role == UserRole::Admin {
        return Ok(());
    }
    match storage.is_halaqa_teacher(halaqa_id, user.id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(forbidden(
            ErrorCode::SubmissionPermissionDenied,
            "您不是该 halaqa 的教师",
        )),
        Err(e) => Err(internal_error("校验 halaqa 教师失败", e)),
    }
}

impl SubmissionService {
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

    /// 上传音频（首次提交或重新提交）
    pub async fn submit(
        &self,
        task_id: i64,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        submit::handle_submit(self, task_id, payload, request).await
    }

    /// 重做：删除本人的提交
    pub async fn retry(&self, task_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        submit::handle_retry(self, task_id, request).await
    }

    /// 教师待评列表
    pub async fn list_submissions(
        &self,
        params: SubmissionListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        review::list_submissions(self, params, request).await
    }

    /// 评分页详情
    pub async fn get_detail(
        &self,
        submission_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        review::get_detail(self, submission_id, request).await
    }

    pub async fn grade(
        &self,
        submission_id: i64,
        grade: GradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        review::grade(self, submission_id, grade, request).await
    }

    pub async fn download_audio(
        &self,
        submission_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        audio::handle_download(self, submission_id, request).await
    }
}
