//! 任务存储操作

use super::SeaOrmStorage;
use crate::entity::tasks::{ActiveModel, Column, Entity as Tasks};
use crate::errors::{HifzError, Result};
use crate::models::tasks::{
    entities::{Task, TaskKind},
    requests::NewTaskRecord,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建任务
    pub async fn create_task_impl(&self, record: NewTaskRecord) -> Result<Task> {
        let model = ActiveModel {
            halaqa_id: Set(record.halaqa_id),
            created_by: Set(record.created_by),
            kind: Set(record.kind.to_string()),
            surah_id: Set(record.surah_id),
            start_ayah: Set(record.start_ayah),
            end_ayah: Set(record.end_ayah),
            deadline: Set(record.deadline.map(|d| d.timestamp())),
            student_id: Set(record.student_id),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("创建任务失败: {e}")))?;

        Ok(result.into_task())
    }

    /// 通过 ID 获取任务
    pub async fn get_task_by_id_impl(&self, task_id: i64) -> Result<Option<Task>> {
        let result = Tasks::find_by_id(task_id)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询任务失败: {e}")))?;

        Ok(result.map(|m| m.into_task()))
    }

    /// 按 id 批量查询任务，不做可见性过滤
    pub async fn list_tasks_by_ids_impl(&self, task_ids: &[i64]) -> Result<Vec<Task>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = Tasks::find()
            .filter(Column::Id.is_in(task_ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询任务失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_task()).collect())
    }

    /// 列出若干 halaqa 的任务，新的在前
    pub async fn list_halaqa_tasks_impl(
        &self,
        halaqa_ids: &[i64],
        kind: Option<TaskKind>,
    ) -> Result<Vec<Task>> {
        if halaqa_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = Tasks::find().filter(Column::HalaqaId.is_in(halaqa_ids.to_vec()));

        if let Some(kind) = kind {
            select = select.filter(Column::Kind.eq(kind.to_string()));
        }

        let results = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询任务列表失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_task()).collect())
    }

    /// 列出学生可见的任务
    pub async fn list_student_tasks_impl(
        &self,
        student_id: i64,
        halaqa_id: i64,
        joined_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>> {
        let mut select = Tasks::find().filter(Column::HalaqaId.eq(halaqa_id)).filter(
            Condition::any()
                .add(Column::StudentId.is_null())
                .add(Column::StudentId.eq(student_id)),
        );

        if let Some(joined_at) = joined_at {
            select = select.filter(Column::CreatedAt.gte(joined_at.timestamp()));
        }

        let results = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询学生任务失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_task()).collect())
    }
}
