pub mod assign;
pub mod list;
pub mod review;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::users::requests::{
    AssignHalaqaRequest, UpdateTeacherStatusRequest, UpdateUserStatusRequest, UserListParams,
};
use crate::storage::Storage;

/// 管理员的用户管理
pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
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

    // 获取用户列表
    pub async fn list_users(
        &self,
        query: UserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_users(self, query, request).await
    }

    // 审核教师
    pub async fn update_teacher_status(
        &self,
        user_id: i64,
        update: UpdateTeacherStatusRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        review::update_teacher_status(self, user_id, update, request).await
    }

    // 停用 / 启用账号
    pub async fn update_user_status(
        &self,
        user_id: i64,
        update: UpdateUserStatusRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        review::update_user_status(self, user_id, update, request).await
    }

    // 分配学生到 halaqa
    pub async fn assign_halaqa(
        &self,
        user_id: i64,
        assign: AssignHalaqaRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        assign::assign_halaqa(self, user_id, assign, request).await
    }
}
