//! surah 参考数据存储

use super::SeaOrmStorage;
use crate::entity::surahs::{ActiveModel, Column, Entity as Surahs};
use crate::errors::{HifzError, Result};
use crate::models::surahs::entities::Surah;
use crate::utils::quran;
use sea_orm::{ColumnTrait, EntityTrait, QueryOrder, QuerySelect, Set};

impl SeaOrmStorage {
    /// 写入缺失的 surah，返回新写入数量
    pub async fn seed_surahs_impl(&self) -> Result<u64> {
        let existing: Vec<i32> = Surahs::find()
            .select_only()
            .column(Column::Id)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 surah 失败: {e}")))?;

        let missing: Vec<ActiveModel> = quran::all_surahs()
            .into_iter()
            .filter(|s| !existing.contains(&s.number))
            .map(|s| ActiveModel {
                id: Set(s.number),
                name: Set(s.name.to_string()),
                ayah_count: Set(s.ayah_count),
                juz_from: Set(s.juz_from),
                juz_to: Set(s.juz_to),
            })
            .collect();

        let count = missing.len() as u64;
        if count == 0 {
            return Ok(0);
        }

        Surahs::insert_many(missing)
            .exec(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("写入 surah 失败: {e}")))?;

        Ok(count)
    }

    /// 按序号列出全部 surah
    pub async fn list_surahs_impl(&self) -> Result<Vec<Surah>> {
        let results = Surahs::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 surah 列表失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_surah()).collect())
    }

    pub async fn get_surah_by_id_impl(&self, surah_id: i32) -> Result<Option<Surah>> {
        let result = Surahs::find_by_id(surah_id)
            .one(&self.db)
            .await
            .map_err(|e| HifzError::database_operation(format!("查询 surah 失败: {e}")))?;

        Ok(result.map(|m| m.into_surah()))
    }
}
