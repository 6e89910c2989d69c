//! パイプライン状態ストア
//!
//! # 責務
//!
//! - 文字列キーから JSON 値への対応を保持する
//! - ステージ出力をキー単位の上書きでマージする
//!
//! # 不変条件
//!
//! 実行中はキーの削除手段を提供しません（追記のみ）。
//! ステージには共有参照のみを渡すため、ステージが状態を直接書き換えることはありません。
//!
//! # 使用例
//!
//! ```rust
//! use reg_horizon::engine::PipelineState;
//! use serde_json::json;
//!
//! let mut state = PipelineState::from_pairs([("url", json!("https://www.bis.org"))]);
//! state.merge([("route".to_string(), json!("web"))].into_iter().collect());
//!
//! assert_eq!(state.get_str("route"), Some("web"));
//! assert!(state.contains("url"));
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::tool::Payload;

/// パイプライン状態
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PipelineState {
    values: BTreeMap<String, Value>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 実行の初期入力から状態を作る
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 部分更新をマージする（同じキーは上書き）
    pub fn merge(&mut self, update: Payload) {
        self.values.extend(update);
    }

    /// 指定キーだけを取り出してツール入力を作る
    pub fn select(&self, keys: &[&str]) -> Payload {
        keys.iter()
            .filter_map(|key| self.values.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect()
    }
}
