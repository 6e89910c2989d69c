//! パイプライン実行結果の型定義
//!
//! # 主要な型
//!
//! - [`RunResult`][]: 実行結果（終了理由、訪問順、最終状態、ステージごとの実行時間）
//! - [`RunOutcome`][]: 終了理由（完了 / 未対応ルートによる終了）
//! - [`PipelineError`][]: 実行を中断させたエラー
//!
//! # 使用例
//!
//! ```rust,no_run
//! use reg_horizon::engine::{RunOutcome, RunResult};
//!
//! fn report(result: &RunResult) {
//!     match &result.outcome {
//!         RunOutcome::Completed => println!("完了: {:?}", result.visited),
//!         RunOutcome::UnmappedRoute { stage, label } => {
//!             println!("'{stage}' のラベル '{label}' に対応するステージがありません")
//!         }
//!     }
//!     if let Ok(json) = result.to_json() {
//!         println!("{json}");
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use thiserror::Error;

use crate::error::StageError;
use super::context::StageTiming;
use super::state::PipelineState;

/// 最終出力を格納する状態キー
pub const FINAL_OUTPUT_KEY: &str = "final_output";

/// パイプラインの実行結果
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// 終了理由
    pub outcome: RunOutcome,

    /// 訪問したステージ（実行順）
    pub visited: Vec<String>,

    /// 最終状態
    pub state: PipelineState,

    /// ステージごとの実行時間
    pub timings: Vec<StageTiming>,

    /// 開始時刻
    pub start_time: SystemTime,

    /// 総実行時間
    pub total_duration: Duration,
}

impl RunResult {
    /// 結果を JSON 形式でシリアライズ
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 最後のステージまで到達したか
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }

    /// `final_output.output_reference` を取り出す（空文字は `None`）
    pub fn output_reference(&self) -> Option<PathBuf> {
        self.state
            .get(FINAL_OUTPUT_KEY)?
            .get("output_reference")?
            .as_str()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }
}

/// 実行の終了理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// 出口エッジのないステージまで実行した
    Completed,

    /// 条件付きエッジのラベルに対応するステージがなかった
    ///
    /// エラーではなく、以降のステージを実行せずに終了したことを表します。
    UnmappedRoute {
        /// 判定を行ったステージ
        stage: String,
        /// 判定関数が返したラベル（ラベルなしの場合は空文字）
        label: String,
    },
}

/// パイプライン実行エラー
///
/// どのエラーも実行全体を中断します（フェイルファスト）。
#[derive(Debug, Error)]
pub enum PipelineError {
    /// ステージが失敗した
    #[error("ステージ '{stage}' が失敗しました: {source}")]
    Stage {
        /// 失敗したステージ
        stage: String,
        /// 原因
        #[source]
        source: StageError,
    },

    /// ステージが宣言した読み取りキーが状態にない
    #[error("ステージ '{stage}' の入力キー '{key}' が状態にありません")]
    MissingStateKey {
        /// ステージ名
        stage: String,
        /// 欠落したキー
        key: String,
    },

    /// ステージが宣言していないキーを出力した
    #[error("ステージ '{stage}' が宣言されていないキー '{key}' を出力しました")]
    UndeclaredOutput {
        /// ステージ名
        stage: String,
        /// 宣言外のキー
        key: String,
    },

    /// エッジの遷移先が見つからない
    #[error("ステージ '{0}' が見つかりません")]
    UnknownStage(String),
}
