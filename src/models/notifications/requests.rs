use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::PaginationQuery;

/// halaqa 广播请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
}

impl BroadcastRequest {
    /// 去除首尾空白，标题或内容为空时返回错误
    pub fn normalized(self) -> Result<(String, String), String> {
        let title = self.title.trim().to_string();
        let message = self.message.trim().to_string();
        if title.is_empty() {
            return Err("通知标题不能为空".to_string());
        }
        if message.is_empty() {
            return Err("通知内容不能为空".to_string());
        }
        Ok((title, message))
    }
}

/// 通知列表查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct NotificationListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default)]
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_normalized() {
        let req = BroadcastRequest {
            title: "  حلقة الغد ".to_string(),
            message: "بعد العصر".to_string(),
        };
        let (title, message) = req.normalized().unwrap();
        assert_eq!(title, "حلقة الغد");
        assert_eq!(message, "بعد العصر");

        let empty = BroadcastRequest {
            title: "x".to_string(),
            message: "   ".to_string(),
        };
        assert!(empty.normalized().is_err());
    }
}
