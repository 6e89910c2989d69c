//! 抽出レコードの定義
//!
//! LLM レコード抽出器が返し、除外判定器が注釈を付ける中間表現です。
//! パイプライン状態には JSON として格納されます。

use serde::{Deserialize, Serialize};

/// ページから抽出された規制アップデート1件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, alias = "additional_context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// 除外判定の推奨（`Include` / `Exclude`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// 除外判定の理由
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UpdateRecord {
    /// `Exclude` と判定されたか
    pub fn is_excluded(&self) -> bool {
        self.recommendation
            .as_deref()
            .is_some_and(|r| r.trim().eq_ignore_ascii_case("exclude"))
    }
}
