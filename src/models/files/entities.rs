use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/file.ts")]
pub struct File {
    // 文件的唯一标识符
    pub token: String,
    // 上传时的文件名
    pub original_name: String,
    // 磁盘上的文件名
    pub stored_name: String,
    // 文件大小（以字节为单位）
    pub file_size: i64,
    pub content_type: String,
    // 引用该文件的提交数
    pub citation_count: i32,
    // 上传者
    pub user_id: i64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

// 新上传文件记录（用于存储层）
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub token: String,
    pub original_name: String,
    pub stored_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub user_id: i64,
}
