//! halaqa 教师关联实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "halaqa_teachers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub halaqa_id: i64,
    pub teacher_id: i64,
    pub assigned_at: i64,
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
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id"
    )]
    Teacher,
}

impl Related<super::halaqat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Halaqa.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_halaqa_teacher(self) -> crate::models::halaqat::entities::HalaqaTeacher {
        use crate::models::halaqat::entities::HalaqaTeacher;
        use chrono::{DateTime, Utc};

        HalaqaTeacher {
            halaqa_id: self.halaqa_id,
            teacher_id: self.teacher_id,
            assigned_at: DateTime::<Utc>::from_timestamp(self.assigned_at, 0).unwrap_or_default(),
        }
    }
}
