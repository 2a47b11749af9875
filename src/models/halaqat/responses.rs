use serde::Serialize;
use ts_rs::TS;

use super::entities::Halaqa;
use crate::models::surahs::entities::Surah;

/// 注册页使用的 halaqa 选项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct HalaqaOption {
    pub id: i64,
    pub name: String,
}

/// halaqa 列表项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct HalaqaListItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub halaqa: Halaqa,
    pub teacher_ids: Vec<i64>,
    pub student_count: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct HalaqaListResponse {
    pub items: Vec<HalaqaListItem>,
}

/// 可选 surah
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct EligibleSurah {
    pub id: i32,
    pub name: String,
    pub ayah_count: i32,
}

impl From<Surah> for EligibleSurah {
    fn from(surah: Surah) -> Self {
        Self {
            id: surah.id,
            name: surah.name,
            ayah_count: surah.ayah_count,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct EligibleSurahsResponse {
    pub surahs: Vec<EligibleSurah>,
}

/// 广播通知结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/halaqa.ts")]
pub struct BroadcastResponse {
    pub sent_count: i64,
}
