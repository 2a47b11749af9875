//! 任务实体（背诵 / 复习共用一张表）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub halaqa_id: i64,
    pub created_by: i64,
    pub kind: String,
    pub surah_id: i32,
    pub start_ayah: i32,
    pub end_ayah: i32,
    pub deadline: Option<i64>,
    pub student_id: Option<i64>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::halaqat::Entity",
        from = "Column::HalaqaId",
        to = "super::halaqat::Column::Id"
    )]
    Halaqa,
    #[sea_orm(
        belongs_to = "super::surahs::Entity",
        from = "Column::SurahId",
        to = "super::surahs::Column::Id"
    )]
    Surah,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
}

impl Related<super::halaqat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Halaqa.def()
    }
}

impl Related<super::surahs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Surah.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_task(self) -> crate::models::tasks::entities::Task {
        use crate::models::tasks::entities::{Task, TaskKind};
        use chrono::{DateTime, Utc};

        Task {
            id: self.id,
            halaqa_id: self.halaqa_id,
            created_by: self.created_by,
            kind: self.kind.parse::<TaskKind>().unwrap_or(TaskKind::Recitation),
            surah_id: self.surah_id,
            start_ayah: self.start_ayah,
            end_ayah: self.end_ayah,
            deadline: self
                .deadline
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            student_id: self.student_id,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
