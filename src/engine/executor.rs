//! パイプライン実行エンジン本体
//!
//! # 責務
//!
//! - 開始ステージから順にステージを実行し、出力を状態へマージする
//! - 出口エッジ（無条件 / 条件付き）に従って次のステージを選ぶ
//! - ステージの入出力キーの契約を検査する
//!
//! # 処理フロー
//!
//! 1. 読み取りキーがすべて状態にあることを確認
//! 2. ステージを実行（完了を待つ）
//! 3. 出力キーが宣言済みであることを確認し、状態へマージ
//! 4. 出口エッジがなければ完了、未対応ラベルなら [`RunOutcome::UnmappedRoute`] で終了
//!
//! いずれかのステージが失敗した時点で実行を中断します。リトライはしません。

use std::time::Instant;

use tracing::{debug, info, warn};

use super::context::ExecutionContext;
use super::graph::{Edge, PipelineGraph};
use super::result::{PipelineError, RunOutcome, RunResult};
use super::state::PipelineState;

/// パイプライン実行エンジン
pub struct GraphExecutor {
    name: String,
    graph: PipelineGraph,
}

impl GraphExecutor {
    /// 検証済みグラフから実行エンジンを生成
    pub fn new(name: impl Into<String>, graph: PipelineGraph) -> Self {
        Self {
            name: name.into(),
            graph,
        }
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    /// 初期状態からグラフを実行する
    ///
    /// # 戻り値
    ///
    /// - `Ok(RunResult)`: 完了、または未対応ルートで終了
    /// - `Err(PipelineError)`: ステージの失敗または入出力契約違反
    pub async fn run(&self, initial: PipelineState) -> Result<RunResult, PipelineError> {
        let mut context = ExecutionContext::new(&self.name);
        let mut state = initial;
        let mut current = self.graph.entry().to_string();

        info!(graph = %self.name, entry = %current, "パイプラインを開始します");

        let outcome = loop {
            let stage = self
                .graph
                .stage(&current)
                .ok_or_else(|| PipelineError::UnknownStage(current.clone()))?;

            if let Some(key) = stage.reads().into_iter().find(|key| !state.contains(key)) {
                return Err(PipelineError::MissingStateKey {
                    stage: current,
                    key,
                });
            }

            context.start_stage(&current);
            let started = Instant::now();
            let update = stage
                .run(&state)
                .await
                .map_err(|source| PipelineError::Stage {
                    stage: current.clone(),
                    source,
                })?;

            let writes = stage.writes();
            if let Some(key) = update.keys().find(|key| !writes.contains(key)) {
                return Err(PipelineError::UndeclaredOutput {
                    stage: current,
                    key: key.clone(),
                });
            }

            debug!(stage = %current, keys = update.len(), "ステージ出力をマージします");
            state.merge(update);
            let elapsed = started.elapsed();
            context.record_stage(&current, elapsed);
            info!(stage = %current, elapsed_ms = elapsed.as_millis() as u64, "ステージが完了しました");

            match self.graph.edge(&current) {
                None => break RunOutcome::Completed,
                Some(Edge::Direct(to)) => current = to.clone(),
                Some(Edge::Conditional { decide, routes }) => {
                    let label = (**decide)(&state).unwrap_or_default();
                    match routes.get(&label) {
                        Some(to) => current = to.clone(),
                        None => {
                            warn!(stage = %current, label = %label, "ラベルに対応するステージがないため終了します");
                            break RunOutcome::UnmappedRoute {
                                stage: current,
                                label,
                            };
                        }
                    }
                }
            }
        };

        let total_duration = context.total_duration();
        let start_time = context.start_time();
        let visited = context.visited();
        info!(graph = %self.name, ?outcome, stages = visited.len(), "パイプラインが終了しました");

        Ok(RunResult {
            outcome,
            visited,
            state,
            timings: context.into_timings(),
            start_time,
            total_duration,
        })
    }
}
