//! 提交存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use super::files::{insert_cited_file, release_file};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::entity::surahs::{Column as SurahColumn, Entity as Surahs};
use crate::entity::tasks::{Column as TaskColumn, Entity as Tasks};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{HifzError, Result};
use crate::models::{
    PaginationInfo,
    files::entities::NewFileRecord,
    submissions::{
        entities::{Submission, SubmissionRemoval, SubmissionStatus, SubmissionWrite},
        requests::{GradeRecord, SubmissionListQuery},
        responses::{SubmissionListItem, SubmissionListResponse},
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 写入提交：首次上传新建，重新上传替换音频、重置为 submitted 并清空评分
    pub async fn upsert_submission_impl(
        &self,
        task_id: i64,
        student_id: i64,
        file: NewFileRecord,
    ) -> Result<SubmissionWrite> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HifzError::database_operation(format!("开启事务失败: {e}")))?;

        let file = insert_cited_file(&txn, file).await?;

        let existing = Submissions::find()
            .filter(Column::TaskId.eq(task_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询提交失败: {e}")))?;

        let (saved, orphaned_file) = match existing {
            Some(existing) => {
                let previous_token = existing.audio_token.clone();

                let mut model = existing.into_active_model();
                model.audio_token = Set(file.token);
                model.status = Set(SubmissionStatus::Submitted.to_string());
                model.hifdh = Set(None);
                model.rules = Set(None);
                model.score = Set(None);
                model.notes = Set(None);
                model.graded_by = Set(None);
                model.graded_at = Set(None);
                model.updated_at = Set(now);

                let saved = model
                    .update(&txn)
                    .await
                    .map_err(|e| HifzError::database_operation(format!("更新提交失败: {e}")))?;

                let orphaned = release_file(&txn, &previous_token).await?;
                (saved, orphaned)
            }
            None => {
                let saved = ActiveModel {
                    task_id: Set(task_id),
                    student_id: Set(student_id),
                    audio_token: Set(file.token),
                    status: Set(SubmissionStatus::Submitted.to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| HifzError::from_db(e, "创建提交失败"))?;
                (saved, None)
            }
        };

        txn.commit()
            .await
            .map_err(|e| HifzError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(SubmissionWrite {
            submission: saved.into_submission(),
            orphaned_file,
        })
    }

    /// 删除 (task, student) 的提交
    pub async fn delete_submission_impl(
        &self,
        task_id: i64,
        student_id: i64,
    ) -> Result<Option<SubmissionRemoval>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HifzError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(existing) = Submissions::find()
            .filter(Column::TaskId.eq(task_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询提交失败: {e}")))?
        else {
            return Ok(None);
        };

        Submissions::delete_by_id(existing.id)
            .exec(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("删除提交失败: {e}")))?;

        let orphaned_file = release_file(&txn, &existing.audio_token).await?;

        txn.commit()
            .await
            .map_err(|e| HifzError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(SubmissionRemoval {
            submission_id: existing.id,
            orphaned_file,
        }))
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 学生的全部提交
    pub async fn list_student_submissions_impl(&self, student_id: i64) -> Result<Vec<Submission>> {
        let results = Submissions::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::UpdatedAt)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询学生提交失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 若干任务下的全部提交
    pub async fn list_task_submissions_impl(&self, task_ids: &[i64]) -> Result<Vec<Submission>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = Submissions::find()
            .filter(Column::TaskId.is_in(task_ids.to_vec()))
            .order_by_desc(Column::UpdatedAt)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询任务提交失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 评分，最后写入者生效
    pub async fn grade_submission_impl(
        &self,
        submission_id: i64,
        grade: GradeRecord,
    ) -> Result<Option<Submission>> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HifzError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(existing) = Submissions::find_by_id(submission_id)
            .one(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询提交失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        model.status = Set(SubmissionStatus::Graded.to_string());
        model.hifdh = Set(Some(grade.hifdh));
        model.rules = Set(Some(grade.rules));
        model.score = Set(Some(grade.score));
        model.notes = Set(grade.notes);
        model.graded_by = Set(Some(grade.graded_by));
        model.graded_at = Set(Some(now));
        model.updated_at = Set(now);

        let saved = model
            .update(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("保存评分失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| HifzError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(saved.into_submission()))
    }

    /// 列出提交（分页）
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let page = query.page.max(1) as u64;
        let size = query.size.clamp(1, 100) as u64;

        if query.halaqa_ids.is_empty() {
            return Ok(SubmissionListResponse {
                items: Vec::new(),
                pagination: PaginationInfo::new(page, size, 0, 0),
            });
        }

        let mut select = Submissions::find()
            .find_also_related(Tasks)
            .filter(TaskColumn::HalaqaId.is_in(query.halaqa_ids.clone()));

        // 状态筛选
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        // 类型筛选
        if let Some(kind) = query.kind {
            select = select.filter(TaskColumn::Kind.eq(kind.to_string()));
        }

        // 排序
        select = select.order_by_desc(Column::UpdatedAt);

        // 分页查询
        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| HifzError::database_operation(format!("查询提交总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| HifzError::database_operation(format!("查询提交页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询提交列表失败: {e}")))?;

        // 批量查询学生与 surah 名称
        let student_ids: Vec<i64> = rows.iter().map(|(s, _)| s.student_id).collect();
        let surah_ids: Vec<i32> = rows
            .iter()
            .filter_map(|(_, t)| t.as_ref().map(|t| t.surah_id))
            .collect();

        let names: HashMap<i64, String> = Users::find()
            .filter(UserColumn::Id.is_in(student_ids))
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询学生信息失败: {e}")))?
            .into_iter()
            .map(|u| {
                let user = u.into_user();
                (user.id, user.name().to_string())
            })
            .collect();

        let surah_names: HashMap<i32, String> = Surahs::find()
            .filter(SurahColumn::Id.is_in(surah_ids))
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 surah 失败: {e}")))?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let items = rows
            .into_iter()
            .filter_map(|(submission, task)| {
                let task = task?.into_task();
                let submission = submission.into_submission();
                let surah_name = surah_names
                    .get(&task.surah_id)
                    .map(String::as_str)
                    .unwrap_or_default();
                Some(SubmissionListItem {
                    id: submission.id,
                    task_id: task.id,
                    halaqa_id: task.halaqa_id,
                    student_id: submission.student_id,
                    student_name: names
                        .get(&submission.student_id)
                        .cloned()
                        .unwrap_or_default(),
                    kind: task.kind,
                    task_title: task.title(surah_name),
                    status: submission.status,
                    score: submission.score,
                    submitted_at: submission.updated_at,
                })
            })
            .collect();

        Ok(SubmissionListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }
}
