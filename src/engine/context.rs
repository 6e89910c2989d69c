//! ステージ実行コンテキストの管理
//!
//! # 責務
//!
//! - ステージの訪問順を追跡
//! - ステージごとの実行時間を記録
//!
//! 状態そのものは [`PipelineState`](super::PipelineState) が保持し、
//! このコンテキストは実行の経過だけを記録します。
//!
//! # 使用例
//!
//! ```rust
//! use reg_horizon::engine::context::ExecutionContext;
//! use std::time::Duration;
//!
//! let mut ctx = ExecutionContext::new("phase1_scan");
//! ctx.start_stage("router");
//! ctx.record_stage("router", Duration::from_millis(120));
//!
//! assert_eq!(ctx.visited(), vec!["router".to_string()]);
//! assert_eq!(ctx.current_stage(), None);
//! ```

use std::time::{Duration, SystemTime};

use serde::Serialize;

/// 1ステージ分の実行記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    /// ステージ名
    pub stage: String,
    /// 実行時間
    pub duration: Duration,
}

/// ステージ実行コンテキスト
///
/// # フィールド
///
/// - `graph_name`: 実行中のグラフ名（ログ用）
/// - `start_time`: 実行開始時刻
/// - `current_stage`: 現在実行中のステージ名
/// - `timings`: 完了したステージの記録（実行順）
#[derive(Debug)]
pub struct ExecutionContext {
    graph_name: String,
    start_time: SystemTime,
    current_stage: Option<String>,
    timings: Vec<StageTiming>,
}

impl ExecutionContext {
    /// 新しい実行コンテキストを生成
    pub fn new(graph_name: impl Into<String>) -> Self {
        Self {
            graph_name: graph_name.into(),
            start_time: SystemTime::now(),
            current_stage: None,
            timings: Vec::new(),
        }
    }

    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    /// ステージ実行を開始
    pub fn start_stage(&mut self, stage: &str) {
        self.current_stage = Some(stage.to_string());
    }

    /// ステージ完了を記録
    ///
    /// このメソッドを呼ぶと、ステージは訪問済みとして扱われます。
    pub fn record_stage(&mut self, stage: &str, duration: Duration) {
        self.timings.push(StageTiming {
            stage: stage.to_string(),
            duration,
        });
        self.current_stage = None;
    }

    /// 現在実行中のステージ（完了後は `None`）
    pub fn current_stage(&self) -> Option<&str> {
        self.current_stage.as_deref()
    }

    /// 完了したステージ名（訪問順）
    pub fn visited(&self) -> Vec<String> {
        self.timings.iter().map(|t| t.stage.clone()).collect()
    }

    /// 開始からの経過時間
    pub fn total_duration(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
    }

    /// 実行記録を取り出す
    pub fn into_timings(self) -> Vec<StageTiming> {
        self.timings
    }
}
