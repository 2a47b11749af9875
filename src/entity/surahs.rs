//! surah 参考数据实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "surahs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub ayah_count: i32,
    pub juz_from: i32,
    pub juz_to: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tasks::Entity")]
    Tasks,
}

impl Related<super::tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_surah(self) -> crate::models::surahs::entities::Surah {
        crate::models::surahs::entities::Surah {
            id: self.id,
            name: self.name,
            ayah_count: self.ayah_count,
            juz_from: self.juz_from,
            juz_to: self.juz_to,
        }
    }
}
