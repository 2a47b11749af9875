use serde::{Deserialize, Serialize};
use ts_rs::TS;

// surah 参考数据，id 即序号
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/surah.ts")]
pub struct Surah {
    pub id: i32,
    pub name: String,
    pub ayah_count: i32,
    pub juz_from: i32,
    pub juz_to: i32,
}

impl Surah {
    /// 是否可分配给 juz 范围为 [from, to] 的 halaqa
    pub fn eligible_for(&self, juz_from: Option<i32>, juz_to: Option<i32>) -> bool {
        crate::utils::quran::juz_ranges_overlap(self.juz_from, self.juz_to, juz_from, juz_to)
    }

    /// ayah 范围是否合法：1 <= start <= end <= ayah_count
    pub fn contains_range(&self, start_ayah: i32, end_ayah: i32) -> bool {
        1 <= start_ayah && start_ayah <= end_ayah && end_ayah <= self.ayah_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surah(juz_from: i32, juz_to: i32) -> Surah {
        Surah {
            id: 1,
            name: "test".to_string(),
            ayah_count: 10,
            juz_from,
            juz_to,
        }
    }

    #[test]
    fn test_eligibility() {
        assert!(surah(6, 7).eligible_for(Some(4), Some(6)));
        assert!(!surah(7, 9).eligible_for(Some(4), Some(6)));
        assert!(surah(7, 9).eligible_for(None, None));
    }

    #[test]
    fn test_contains_range() {
        let s = surah(1, 1);
        assert!(s.contains_range(1, 10));
        assert!(s.contains_range(3, 3));
        assert!(!s.contains_range(5, 4));
        assert!(!s.contains_range(0, 4));
        assert!(!s.contains_range(1, 11));
    }
}
