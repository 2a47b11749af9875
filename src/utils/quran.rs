//! Quran 参考数据：surah 名称、ayah 数量与 juz 分界

/// 114 个 surah 的名称，按序号排列
const SURAH_NAMES: [&str; 114] = [
    "الفاتحة", "البقرة", "آل عمران", "النساء", "المائدة", "الأنعام", "الأعراف", "الأنفال",
    "التوبة", "يونس", "هود", "يوسف", "الرعد", "إبراهيم", "الحجر", "النحل", "الإسراء", "الكهف",
    "مريم", "طه", "الأنبياء", "الحج", "المؤمنون", "النور", "الفرقان", "الشعراء", "النمل",
    "القصص", "العنكبوت", "الروم", "لقمان", "السجدة", "الأحزاب", "سبأ", "فاطر", "يس",
    "الصافات", "ص", "الزمر", "غافر", "فصلت", "الشورى", "الزخرف", "الدخان", "الجاثية",
    "الأحقاف", "محمد", "الفتح", "الحجرات", "ق", "الذاريات", "الطور", "النجم", "القمر",
    "الرحمن", "الواقعة", "الحديد", "المجادلة", "الحشر", "الممتحنة", "الصف", "الجمعة",
    "المنافقون", "التغابن", "الطلاق", "التحريم", "الملك", "القلم", "الحاقة", "المعارج", "نوح",
    "الجن", "المزمل", "المدثر", "القيامة", "الإنسان", "المرسلات", "النبأ", "النازعات", "عبس",
    "التكوير", "الانفطار", "المطففين", "الانشقاق", "البروج", "الطارق", "الأعلى", "الغاشية",
    "الفجر", "البلد", "الشمس", "الليل", "الضحى", "الشرح", "التين", "العلق", "القدر", "البينة",
    "الزلزلة", "العاديات", "القارعة", "التكاثر", "العصر", "الهمزة", "الفيل", "قريش", "الماعون",
    "الكوثر", "الكافرون", "النصر", "المسد", "الإخلاص", "الفلق", "الناس",
];

/// 每个 surah 的 ayah 数量
const AYAH_COUNTS: [i32; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// 30 个 juz 的起点 (surah, ayah)
const JUZ_STARTS: [(i32, i32); 30] = [
    (1, 1),
    (2, 142),
    (2, 253),
    (3, 93),
    (4, 24),
    (4, 148),
    (5, 82),
    (6, 111),
    (7, 88),
    (8, 41),
    (9, 93),
    (11, 6),
    (12, 53),
    (15, 1),
    (17, 1),
    (18, 75),
    (21, 1),
    (23, 1),
    (25, 21),
    (27, 56),
    (29, 46),
    (33, 31),
    (36, 28),
    (39, 32),
    (41, 47),
    (46, 1),
    (51, 31),
    (58, 1),
    (67, 1),
    (78, 1),
];

pub const SURAH_COUNT: usize = 114;
pub const JUZ_COUNT: i32 = 30;

/// 单个 surah 的参考信息
#[derive(Debug, Clone, PartialEq)]
pub struct SurahInfo {
    pub number: i32,
    pub name: &'static str,
    pub ayah_count: i32,
    pub juz_from: i32,
    pub juz_to: i32,
}

/// 指定位置所在的 juz
pub fn juz_of(surah: i32, ayah: i32) -> i32 {
    JUZ_STARTS
        .iter()
        .rposition(|&start| (surah, ayah) >= start)
        .map(|idx| idx as i32 + 1)
        .unwrap_or(1)
}

/// 全部 surah 的参考数据，juz 范围由首尾 ayah 计算
pub fn all_surahs() -> Vec<SurahInfo> {
    (0..SURAH_COUNT)
        .map(|idx| {
            let number = idx as i32 + 1;
            let ayah_count = AYAH_COUNTS[idx];
            SurahInfo {
                number,
                name: SURAH_NAMES[idx],
                ayah_count,
                juz_from: juz_of(number, 1),
                juz_to: juz_of(number, ayah_count),
            }
        })
        .collect()
}

/// juz 区间重叠判断：surah 与 halaqa 的 juz 范围有交集即可选
///
/// halaqa 未设置的端点视为 1 / 30。
pub fn juz_ranges_overlap(
    surah_from: i32,
    surah_to: i32,
    halaqa_from: Option<i32>,
    halaqa_to: Option<i32>,
) -> bool {
    let from = halaqa_from.unwrap_or(1);
    let to = halaqa_to.unwrap_or(JUZ_COUNT);
    surah_from <= to && surah_to >= from
}
