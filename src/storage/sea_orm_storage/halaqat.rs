//! halaqa 存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::halaqa_teachers::{
    ActiveModel as HalaqaTeacherActiveModel, Column as HalaqaTeacherColumn,
    Entity as HalaqaTeachers,
};
use crate::entity::halaqat::{ActiveModel, Column, Entity as Halaqat};
use crate::entity::profiles::{Column as ProfileColumn, Entity as Profiles};
use crate::errors::{HifzError, Result};
use crate::models::halaqat::{
    entities::{Halaqa, HalaqaTeacher},
    requests::{CreateHalaqaRequest, UpdateHalaqaRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 创建 halaqa
    pub async fn create_halaqa_impl(&self, req: CreateHalaqaRequest) -> Result<Halaqa> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            juz_from: Set(req.juz_from),
            juz_to: Set(req.juz_to),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HifzError::from_db(e, "创建 halaqa 失败"))?;

        Ok(result.into_halaqa())
    }

    /// 通过 ID 获取 halaqa
    pub async fn get_halaqa_by_id_impl(&self, halaqa_id: i64) -> Result<Option<Halaqa>> {
        let result = Halaqat::find_by_id(halaqa_id)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 halaqa 失败: {e}")))?;

        Ok(result.map(|m| m.into_halaqa()))
    }

    /// 更新 halaqa，juz 范围整体替换
    pub async fn update_halaqa_impl(
        &self,
        halaqa_id: i64,
        update: UpdateHalaqaRequest,
    ) -> Result<Option<Halaqa>> {
        let Some(existing) = Halaqat::find_by_id(halaqa_id)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 halaqa 失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        model.updated_at = Set(chrono::Utc::now().timestamp());

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        model.juz_from = Set(update.juz_from);
        model.juz_to = Set(update.juz_to);
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| HifzError::from_db(e, "更新 halaqa 失败"))?;

        Ok(Some(updated.into_halaqa()))
    }

    /// 列出全部 halaqa
    pub async fn list_halaqat_impl(&self) -> Result<Vec<Halaqa>> {
        let results = Halaqat::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 halaqa 列表失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_halaqa()).collect())
    }

    /// 列出教师负责的 halaqa
    pub async fn list_teacher_halaqat_impl(&self, teacher_id: i64) -> Result<Vec<Halaqa>> {
        let halaqa_ids: Vec<i64> = HalaqaTeachers::find()
            .select_only()
            .column(HalaqaTeacherColumn::HalaqaId)
            .filter(HalaqaTeacherColumn::TeacherId.eq(teacher_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询教师 halaqa 失败: {e}")))?;

        if halaqa_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = Halaqat::find()
            .filter(Column::Id.is_in(halaqa_ids))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 halaqa 列表失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_halaqa()).collect())
    }

    /// 列出 halaqa 的教师 ID
    pub async fn list_halaqa_teacher_ids_impl(&self, halaqa_id: i64) -> Result<Vec<i64>> {
        HalaqaTeachers::find()
            .select_only()
            .column(HalaqaTeacherColumn::TeacherId)
            .filter(HalaqaTeacherColumn::HalaqaId.eq(halaqa_id))
            .order_by_asc(HalaqaTeacherColumn::AssignedAt)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 halaqa 教师失败: {e}")))
    }

    /// 教师是否负责该 halaqa
    pub async fn is_halaqa_teacher_impl(&self, halaqa_id: i64, teacher_id: i64) -> Result<bool> {
        let found = HalaqaTeachers::find()
            .filter(HalaqaTeacherColumn::HalaqaId.eq(halaqa_id))
            .filter(HalaqaTeacherColumn::TeacherId.eq(teacher_id))
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 halaqa 教师失败: {e}")))?;

        Ok(found.is_some())
    }

    /// 为 halaqa 指派教师
    pub async fn add_halaqa_teacher_impl(
        &self,
        halaqa_id: i64,
        teacher_id: i64,
    ) -> Result<HalaqaTeacher> {
        let model = HalaqaTeacherActiveModel {
            halaqa_id: Set(halaqa_id),
            teacher_id: Set(teacher_id),
            assigned_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HifzError::from_db(e, "指派教师失败"))?;

        Ok(result.into_halaqa_teacher())
    }

    /// 移除 halaqa 教师
    pub async fn remove_halaqa_teacher_impl(&self, halaqa_id: i64, teacher_id: i64) -> Result<bool> {
        let result = HalaqaTeachers::delete_many()
            .filter(HalaqaTeacherColumn::HalaqaId.eq(halaqa_id))
            .filter(HalaqaTeacherColumn::TeacherId.eq(teacher_id))
            .exec(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("移除 halaqa 教师失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计每个 halaqa 的学生数
    pub async fn count_students_by_halaqa_impl(&self) -> Result<HashMap<i64, i64>> {
        let rows: Vec<(Option<i64>, i64)> = Profiles::find()
            .select_only()
            .column(ProfileColumn::HalaqaId)
            .column_as(ProfileColumn::Id.count(), "student_count")
            .filter(ProfileColumn::HalaqaId.is_not_null())
            .group_by(ProfileColumn::HalaqaId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("统计 halaqa 学生数失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(halaqa_id, count)| halaqa_id.map(|id| (id, count)))
            .collect())
    }

    /// 按名称补齐 halaqa，已存在的跳过
    pub async fn ensure_halaqat_impl(&self, names: &[String]) -> Result<u64> {
        let mut created = 0;

        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let exists = Halaqat::find()
                .filter(Column::Name.eq(name))
                .one(&self.db)
                .await
                .map_err(|e| HifzError::database_operation(format!("查询 halaqa 失败: {e}")))?
                .is_some();
            if exists {
                continue;
            }

            self.create_halaqa_impl(CreateHalaqaRequest {
                name: name.to_string(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await?;
            created += 1;
        }

        Ok(created)
    }
}
