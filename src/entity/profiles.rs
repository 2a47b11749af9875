//! 用户资料实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub halaqa_id: Option<i64>,
    pub halaqa_joined_at: Option<i64>,
    pub teacher_status: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub guardian_phone: Option<String>,
    pub institution: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::halaqat::Entity",
        from = "Column::HalaqaId",
        to = "super::halaqat::Column::Id"
    )]
    Halaqa,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::halaqat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Halaqa.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务模型，role 取自所属用户
    pub fn into_profile(
        self,
        role: crate::models::users::entities::UserRole,
    ) -> crate::models::users::entities::Profile {
        use crate::models::users::entities::{Gender, Profile, TeacherStatus};
        use chrono::{DateTime, NaiveDate, Utc};

        Profile {
            user_id: self.user_id,
            role,
            halaqa_id: self.halaqa_id,
            halaqa_joined_at: self
                .halaqa_joined_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            teacher_status: self
                .teacher_status
                .parse::<TeacherStatus>()
                .unwrap_or(TeacherStatus::Pending),
            gender: self.gender.and_then(|g| g.parse::<Gender>().ok()),
            birth_date: self
                .birth_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            guardian_phone: self.guardian_phone,
            institution: self.institution,
            bio: self.bio,
            avatar_url: self.avatar_url,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
