//! 行アクションのディスパッチャー
//!
//! # 責務
//!
//! 行コレクションを先頭から順に処理し、各行の出力を決めます。
//!
//! # 行ごとの処理
//!
//! 1. アクションを正規化する
//! 2. 出力が確定済み（成功またはエラー）なら、外部呼び出しをせずにそのまま引き継ぐ
//! 3. `no action` なら [`RowOutput::Skipped`]
//! 4. `summarize` / `custom:` なら取得 → クリーニング → 抽出 → 要約の順に呼び出す
//!
//! 1行の失敗は [`RowOutput::Error`] として記録し、残りの行の処理を続けます。
//! 各行の出力はその行の内容だけで決まります。

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ToolError;
use crate::model::{Action, Row, RowOutput};
use crate::tool::{payload, Payload, Tool, Toolkit};

/// 行ごとの処理結果の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// 外部呼び出しを行い成功した
    Processed,
    /// `no action` のため処理しなかった
    Skipped,
    /// 確定済みの出力を引き継いだ
    Reused,
    /// 外部呼び出しが失敗した
    Failed,
}

/// ディスパッチ結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// 入力行と同じ順序・同じ件数の出力
    pub outputs: Vec<RowOutput>,
    /// 各行の処理結果の分類（`outputs` と同じ並び）
    pub dispositions: Vec<Disposition>,
    pub processed: usize,
    pub skipped: usize,
    pub reused: usize,
    pub failed: usize,
}

impl DispatchReport {
    fn record(&mut self, output: RowOutput, disposition: Disposition) {
        match disposition {
            Disposition::Processed => self.processed += 1,
            Disposition::Skipped => self.skipped += 1,
            Disposition::Reused => self.reused += 1,
            Disposition::Failed => self.failed += 1,
        }
        self.outputs.push(output);
        self.dispositions.push(disposition);
    }

    /// 出力を行へ書き戻す
    ///
    /// ディスパッチに渡した行と同じ並びの行を渡してください。
    /// 引き継いだ行はセルの文字列をそのまま残します。
    pub fn apply(&self, rows: &mut [Row]) {
        for ((row, output), disposition) in rows.iter_mut().zip(&self.outputs).zip(&self.dispositions) {
            if *disposition != Disposition::Reused {
                row.set_output(output);
            }
        }
    }
}

/// 行アクションのディスパッチャー
pub struct RowDispatcher {
    fetcher: Arc<dyn Tool>,
    cleaner: Arc<dyn Tool>,
    extractor: Arc<dyn Tool>,
    summarizer: Arc<dyn Tool>,
}

impl RowDispatcher {
    pub fn new(
        fetcher: Arc<dyn Tool>,
        cleaner: Arc<dyn Tool>,
        extractor: Arc<dyn Tool>,
        summarizer: Arc<dyn Tool>,
    ) -> Self {
        Self {
            fetcher,
            cleaner,
            extractor,
            summarizer,
        }
    }

    pub fn from_toolkit(toolkit: &Toolkit) -> Self {
        Self::new(
            toolkit.fetcher.clone(),
            toolkit.cleaner.clone(),
            toolkit.extractor.clone(),
            toolkit.summarizer.clone(),
        )
    }

    /// 全行を順に処理する
    pub async fn dispatch(&self, rows: &[Row]) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (index, row) in rows.iter().enumerate() {
            let (output, disposition) = self.process_row(row).await;
            info!(row = index, link = %row.link, ?disposition, "行を処理しました");
            report.record(output, disposition);
        }
        info!(
            processed = report.processed,
            skipped = report.skipped,
            reused = report.reused,
            failed = report.failed,
            "ディスパッチが完了しました"
        );
        report
    }

    /// 1行を処理する
    pub async fn process_row(&self, row: &Row) -> (RowOutput, Disposition) {
        let current = row.output_state();
        if current.is_terminal() {
            return (current, Disposition::Reused);
        }

        let action = row.action();
        if !action.is_actionable() {
            return (RowOutput::Skipped, Disposition::Skipped);
        }

        match self.summarize(&row.link, &action).await {
            Ok(summary) => (RowOutput::success(summary), Disposition::Processed),
            Err(e) => {
                warn!(link = %row.link, error = %e, "行の処理に失敗しました");
                (RowOutput::Error(e.to_string()), Disposition::Failed)
            }
        }
    }

    async fn summarize(&self, link: &str, action: &Action) -> Result<String, ToolError> {
        if link.trim().is_empty() {
            return Err(ToolError::MissingInput {
                tool: self.fetcher.name().to_string(),
                key: "url".to_string(),
            });
        }

        let mut carried = payload([("url", json!(link))]);
        for tool in [&self.fetcher, &self.cleaner, &self.extractor] {
            let output = tool.run(&carried).await?;
            carried.extend(output);
        }

        let mut inputs: Payload = payload([
            ("url", carried.get("url").cloned().unwrap_or_else(|| json!(link))),
            ("extracted_text", carried.get("extracted_text").cloned().unwrap_or(Value::Null)),
        ]);
        if let Some(objective) = action.objective() {
            inputs.insert("objective".to_string(), json!(objective));
        }

        let output = self.summarizer.run(&inputs).await?;
        Ok(output
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
