//! halaqa 实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "halaqat")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub juz_from: Option<i32>,
    pub juz_to: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::halaqa_teachers::Entity")]
    HalaqaTeachers,
    #[sea_orm(has_many = "super::profiles::Entity")]
    Profiles,
    #[sea_orm(has_many = "super::tasks::Entity")]
    Tasks,
}

impl Related<super::halaqa_teachers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HalaqaTeachers.def()
    }
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl Related<super::tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_halaqa(self) -> crate::models::halaqat::entities::Halaqa {
        use crate::models::halaqat::entities::Halaqa;
        use chrono::{DateTime, Utc};

        Halaqa {
            id: self.id,
            name: self.name,
            juz_from: self.juz_from,
            juz_to: self.juz_to,
            description: self.description,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
