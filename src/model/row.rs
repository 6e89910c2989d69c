//! 行（規制アップデート候補1件）の定義

use std::collections::BTreeMap;

use serde::Serialize;

use super::action::{Action, NO_ACTION};
use super::output::RowOutput;
use super::record::UpdateRecord;

/// 追加列名: 除外判定の推奨
pub const RECOMMENDATION_COLUMN: &str = "Recommendation";
/// 追加列名: 除外判定の理由
pub const REASON_COLUMN: &str = "Reason";

/// 規制アップデート候補1件
///
/// `action` と `output` は読み込んだ文字列のまま保持し、
/// 解釈は [`Row::action`] と [`Row::output_state`] で行います。
/// 認識できないアクション文字列は代入時に `no action` へ正規化されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub date: Option<String>,
    pub topic: Option<String>,
    pub context: Option<String>,
    pub regulator: Option<String>,
    pub link: String,
    action: String,
    pub output: String,
    /// 既知列以外の列（列名 → 値）
    pub extras: BTreeMap<String, String>,
}

impl Row {
    /// リンクのみを持つ未処理の行を作る
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            date: None,
            topic: None,
            context: None,
            regulator: None,
            link: link.into(),
            action: NO_ACTION.to_string(),
            output: String::new(),
            extras: BTreeMap::new(),
        }
    }

    pub fn with_action(mut self, raw: &str) -> Self {
        self.set_action(raw);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// アクション文字列を設定する（認識できない場合は `no action`）
    pub fn set_action(&mut self, raw: &str) {
        self.action = normalize_action(raw);
    }

    /// 正規化済みのアクション文字列
    pub fn action_text(&self) -> &str {
        &self.action
    }

    /// アクションを解釈する
    pub fn action(&self) -> Action {
        Action::parse(&self.action)
    }

    /// 出力の状態を解釈する
    pub fn output_state(&self) -> RowOutput {
        RowOutput::parse(&self.output)
    }

    pub fn set_output(&mut self, output: &RowOutput) {
        self.output = output.to_string();
    }
}

/// アクション文字列を正規化する
///
/// 認識できる形式は元の表記を保ち（前後の空白のみ除去）、
/// それ以外は `no action` にします。
pub fn normalize_action(raw: &str) -> String {
    if Action::is_recognized(raw) {
        raw.trim().to_string()
    } else {
        NO_ACTION.to_string()
    }
}

impl From<UpdateRecord> for Row {
    fn from(record: UpdateRecord) -> Self {
        let mut row = Row::new(record.link.unwrap_or_default());
        row.date = record.date;
        row.topic = record.topic;
        row.context = record.context;
        row.regulator = record.regulator;
        if let Some(recommendation) = record.recommendation {
            row.extras.insert(RECOMMENDATION_COLUMN.to_string(), recommendation);
        }
        if let Some(reason) = record.reason {
            row.extras.insert(REASON_COLUMN.to_string(), reason);
        }
        row
    }
}
