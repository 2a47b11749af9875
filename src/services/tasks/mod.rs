pub mod create;
pub mod mine;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::tasks::requests::{CreateStudentTaskRequest, CreateTaskRequest};
use crate::storage::Storage;

pub struct TaskService {
    storage: Option<Arc<dyn Storage>>,
}

impl TaskService {
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

    // 为整个 halaqa 布置任务
    pub async fn create_task(
        &self,
        req: CreateTaskRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_task(self, req, request).await
    }

    // 为单个学生布置任务
    pub async fn create_student_task(
        &self,
        req: CreateStudentTaskRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_student_task(self, req, request).await
    }

    // 学生自己的任务
    pub async fn list_my_tasks(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        mine::list_my_tasks(self, request).await
    }
}
