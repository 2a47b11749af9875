use super::SeaOrmStorage;
use crate::entity::profiles::{
    ActiveModel as ProfileActiveModel, Column as ProfileColumn, Entity as Profiles,
    Model as ProfileModel,
};
use crate::entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel};
use crate::errors::{HifzError, Result};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{Profile, TeacherStatus, User, UserRole},
        requests::{RegisterUserRecord, UpdateProfileFields, UpdateUserRequest, UserListQuery},
        responses::{UserListResponse, UserWithProfile},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

fn with_profile((user, profile): (UserModel, Option<ProfileModel>)) -> UserWithProfile {
    let user = user.into_user();
    let profile = profile.map(|p| p.into_profile(user.role));
    UserWithProfile { user, profile }
}

impl SeaOrmStorage {
    /// 注册用户：用户与资料在同一事务中创建
    pub async fn register_user_impl(&self, record: RegisterUserRecord) -> Result<UserWithProfile> {
        let now = chrono::Utc::now().timestamp();
        let teacher_status = TeacherStatus::initial_for(record.role);

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HifzError::database_operation(format!("开启事务失败: {e}")))?;

        let user = ActiveModel {
            username: Set(record.username),
            email: Set(record.email),
            password_hash: Set(record.password_hash),
            role: Set(record.role.to_string()),
            status: Set(teacher_status.account_status().to_string()),
            display_name: Set(record.display_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| HifzError::from_db(e, "创建用户失败"))?;

        let profile = ProfileActiveModel {
            user_id: Set(user.id),
            halaqa_id: Set(record.halaqa_id),
            halaqa_joined_at: Set(record.halaqa_id.map(|_| now)),
            teacher_status: Set(teacher_status.to_string()),
            gender: Set(record.gender.map(|g| g.to_string())),
            birth_date: Set(record.birth_date.map(|d| d.format("%Y-%m-%d").to_string())),
            guardian_phone: Set(record.guardian_phone),
            institution: Set(record.institution),
            bio: Set(record.bio),
            avatar_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| HifzError::from_db(e, "创建用户资料失败"))?;

        txn.commit()
            .await
            .map_err(|e| HifzError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(with_profile((user, Some(profile))))
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名或邮箱获取用户
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        let result = Users::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 获取用户及资料
    pub async fn get_user_with_profile_impl(&self, id: i64) -> Result<Option<UserWithProfile>> {
        let result = Users::find_by_id(id)
            .find_also_related(Profiles)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户资料失败: {e}")))?;

        Ok(result.map(with_profile))
    }

    /// 批量获取用户及资料
    pub async fn list_users_with_profiles_by_ids_impl(
        &self,
        ids: &[i64],
    ) -> Result<Vec<UserWithProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .find_also_related(Profiles)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("批量查询用户失败: {e}")))?;

        Ok(rows.into_iter().map(with_profile).collect())
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Users::find().find_also_related(Profiles);

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Username.contains(&escaped))
                    .add(Column::Email.contains(&escaped))
                    .add(Column::DisplayName.contains(&escaped)),
            );
        }

        // 角色筛选
        if let Some(role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        // 状态筛选
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        // 审核状态筛选
        if let Some(teacher_status) = query.teacher_status {
            select = select.filter(ProfileColumn::TeacherStatus.eq(teacher_status.to_string()));
        }

        // halaqa 筛选
        if let Some(halaqa_id) = query.halaqa_id {
            select = select.filter(ProfileColumn::HalaqaId.eq(halaqa_id));
        }

        // 排序
        select = select.order_by_desc(Column::CreatedAt);

        // 分页查询
        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: rows.into_iter().map(with_profile).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("更新最后登录时间失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        // 先检查用户是否存在
        let existing = self.get_user_by_id_impl(id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }

        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        if let Some(display_name) = update.display_name {
            model.display_name = Set(Some(display_name));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| HifzError::from_db(e, "更新用户失败"))?;

        self.get_user_by_id_impl(id).await
    }

    /// 更新用户资料
    pub async fn update_profile_impl(
        &self,
        user_id: i64,
        update: UpdateProfileFields,
    ) -> Result<Option<Profile>> {
        let Some((profile, user)) = Profiles::find()
            .filter(ProfileColumn::UserId.eq(user_id))
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户资料失败: {e}")))?
        else {
            return Ok(None);
        };

        let role = user
            .map(|u| u.into_user().role)
            .unwrap_or(UserRole::Student);

        let mut model = profile.into_active_model();
        model.updated_at = Set(chrono::Utc::now().timestamp());

        if let Some(gender) = update.gender {
            model.gender = Set(Some(gender.to_string()));
        }

        if let Some(birth_date) = update.birth_date {
            model.birth_date = Set(Some(birth_date.format("%Y-%m-%d").to_string()));
        }

        if let Some(phone) = update.guardian_phone {
            model.guardian_phone = Set(Some(phone));
        }

        if let Some(institution) = update.institution {
            model.institution = Set(Some(institution));
        }

        if let Some(bio) = update.bio {
            model.bio = Set(Some(bio));
        }

        if let Some(avatar_url) = update.avatar_url {
            model.avatar_url = Set(Some(avatar_url));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("更新用户资料失败: {e}")))?;

        Ok(Some(updated.into_profile(role)))
    }

    /// 审核教师，审核状态与账号状态同时更新
    pub async fn set_teacher_status_impl(
        &self,
        user_id: i64,
        status: TeacherStatus,
    ) -> Result<Option<UserWithProfile>> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HifzError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(user) = Users::find_by_id(user_id)
            .one(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询用户失败: {e}")))?
        else {
            return Ok(None);
        };

        if user.role != UserRole::Teacher.as_str() && status != TeacherStatus::Approved {
            return Err(HifzError::validation(
                "非教师用户的审核状态只能为 approved",
            ));
        }

        let updated = Profiles::update_many()
            .col_expr(
                ProfileColumn::TeacherStatus,
                sea_orm::sea_query::Expr::value(status.to_string()),
            )
            .col_expr(ProfileColumn::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(ProfileColumn::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("更新审核状态失败: {e}")))?;

        if updated.rows_affected == 0 {
            return Err(HifzError::not_found(format!("用户 {user_id} 没有资料")));
        }

        Users::update_many()
            .col_expr(
                Column::Status,
                sea_orm::sea_query::Expr::value(status.account_status().to_string()),
            )
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| HifzError::database_operation(format!("更新账号状态失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| HifzError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_user_with_profile_impl(user_id).await
    }

    /// 设置学生所在 halaqa，仅在 halaqa 变化时重置加入时间
    pub async fn set_student_halaqa_impl(
        &self,
        student_id: i64,
        halaqa_id: Option<i64>,
    ) -> Result<bool> {
        let profile = Profiles::find()
            .filter(ProfileColumn::UserId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询学生资料失败: {e}")))?;

        let Some(profile) = profile else {
            return Ok(false);
        };
        // 重复分配到同一 halaqa 不改动加入时间
        if profile.halaqa_id == halaqa_id {
            return Ok(true);
        }

        let now = chrono::Utc::now().timestamp();
        let mut active = profile.into_active_model();
        active.halaqa_id = Set(halaqa_id);
        active.halaqa_joined_at = Set(halaqa_id.map(|_| now));
        active.updated_at = Set(now);
        active
            .update(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("更新学生 halaqa 失败: {e}")))?;

        Ok(true)
    }

    /// 列出 halaqa 当前的学生
    pub async fn list_halaqa_students_impl(&self, halaqa_id: i64) -> Result<Vec<UserWithProfile>> {
        let rows = Users::find()
            .find_also_related(Profiles)
            .filter(ProfileColumn::HalaqaId.eq(halaqa_id))
            .filter(Column::Role.eq(UserRole::Student.to_string()))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 halaqa 学生失败: {e}")))?;

        Ok(rows.into_iter().map(with_profile).collect())
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        let count = Users::find()
            .count(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("统计用户数量失败: {e}")))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, record};
    use crate::models::halaqat::requests::CreateHalaqaRequest;
    use crate::models::users::entities::{TeacherStatus, UserRole, UserStatus};
    use crate::models::users::requests::UserListQuery;

    #[tokio::test]
    async fn test_register_student_and_teacher() {
        let storage = memory_storage().await;

        let student = storage
            .register_user_impl(record("ali", UserRole::Student, None))
            .await
            .unwrap();
        assert_eq!(student.user.status, UserStatus::Active);
        let profile = student.profile.unwrap();
        assert_eq!(profile.teacher_status, TeacherStatus::Approved);
        assert_eq!(profile.role, UserRole::Student);

        let teacher = storage
            .register_user_impl(record("umar", UserRole::Teacher, None))
            .await
            .unwrap();
        assert_eq!(teacher.user.status, UserStatus::Inactive);
        assert_eq!(
            teacher.profile.unwrap().teacher_status,
            TeacherStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_duplicate_username_rolls_back() {
        let storage = memory_storage().await;
        storage
            .register_user_impl(record("ali", UserRole::Student, None))
            .await
            .unwrap();

        let mut dup = record("ali", UserRole::Student, None);
        dup.email = "other@example.com".to_string();
        let err = storage.register_user_impl(dup).await.unwrap_err();
        assert_eq!(err.code(), "E010");

        assert_eq!(storage.count_users_impl().await.unwrap(), 1);
        assert!(
            storage
                .get_user_by_email_impl("other@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_teacher_approval() {
        let storage = memory_storage().await;
        let teacher = storage
            .register_user_impl(record("umar", UserRole::Teacher, None))
            .await
            .unwrap();

        let approved = storage
            .set_teacher_status_impl(teacher.user.id, TeacherStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.user.status, UserStatus::Active);
        assert_eq!(
            approved.profile.unwrap().teacher_status,
            TeacherStatus::Approved
        );

        let rejected = storage
            .set_teacher_status_impl(teacher.user.id, TeacherStatus::Rejected)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.user.status, UserStatus::Inactive);

        let pending_teachers = storage
            .list_users_with_pagination_impl(UserListQuery {
                teacher_status: Some(TeacherStatus::Rejected),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending_teachers.items.len(), 1);
    }

    #[tokio::test]
    async fn test_student_cannot_leave_approved() {
        let storage = memory_storage().await;
        let student = storage
            .register_user_impl(record("ali", UserRole::Student, None))
            .await
            .unwrap();

        let err = storage
            .set_teacher_status_impl(student.user.id, TeacherStatus::Pending)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[tokio::test]
    async fn test_assign_and_unassign_halaqa() {
        let storage = memory_storage().await;
        let halaqa = storage
            .create_halaqa_impl(CreateHalaqaRequest {
                name: "حلقة الفجر".to_string(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        let student = storage
            .register_user_impl(record("ali", UserRole::Student, None))
            .await
            .unwrap();

        assert!(
            storage
                .set_student_halaqa_impl(student.user.id, Some(halaqa.id))
                .await
                .unwrap()
        );
        let students = storage.list_halaqa_students_impl(halaqa.id).await.unwrap();
        assert_eq!(students.len(), 1);
        assert!(students[0].profile.as_ref().unwrap().halaqa_joined_at.is_some());

        storage
            .set_student_halaqa_impl(student.user.id, None)
            .await
            .unwrap();
        let profile = storage
            .get_user_with_profile_impl(student.user.id)
            .await
            .unwrap()
            .unwrap()
            .profile
            .unwrap();
        assert!(profile.halaqa_id.is_none());
        assert!(profile.halaqa_joined_at.is_none());
    }

    async fn joined_at(
        storage: &super::SeaOrmStorage,
        user_id: i64,
    ) -> Option<chrono::DateTime<chrono::Utc>> {
        storage
            .get_user_with_profile_impl(user_id)
            .await
            .unwrap()
            .unwrap()
            .profile
            .unwrap()
            .halaqa_joined_at
    }

    #[tokio::test]
    async fn test_reassign_same_halaqa_keeps_join_time() {
        let storage = memory_storage().await;
        let halaqa = storage
            .create_halaqa_impl(CreateHalaqaRequest {
                name: "حلقة العصر".to_string(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        let other = storage
            .create_halaqa_impl(CreateHalaqaRequest {
                name: "حلقة المغرب".to_string(),
                juz_from: None,
                juz_to: None,
                description: None,
            })
            .await
            .unwrap();
        let student = storage
            .register_user_impl(record("bilal", UserRole::Student, Some(halaqa.id)))
            .await
            .unwrap();
        let joined = student.profile.unwrap().halaqa_joined_at;
        assert!(joined.is_some());

        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(
            storage
                .set_student_halaqa_impl(student.user.id, Some(halaqa.id))
                .await
                .unwrap()
        );
        assert_eq!(joined_at(&storage, student.user.id).await, joined);

        // 换到其他 halaqa 才重新计时
        storage
            .set_student_halaqa_impl(student.user.id, Some(other.id))
            .await
            .unwrap();
        let moved = joined_at(&storage, student.user.id).await;
        assert!(moved.is_some());
        assert!(moved > joined);

        // 没有资料的用户
        assert!(!storage.set_student_halaqa_impl(999, Some(halaqa.id)).await.unwrap());
    }
}
