//! パイプライン実行エンジン
//!
//! # 責務
//!
//! - 名前付きステージとエッジからなる有向非巡回グラフを構築・検証
//! - 共有状態をステージ間で受け渡しながら、条件付きルーティングに従って実行
//! - 実行の経過（訪問順・実行時間）を記録
//!
//! # モジュール構成
//!
//! - [`state`][]: パイプライン状態ストア
//! - [`stage`][]: ステージのインターフェース
//! - [`graph`][]: グラフの構築と検証
//! - [`executor`][]: 実行エンジン本体
//! - [`context`][]: 実行コンテキスト（訪問順と実行時間）
//! - [`result`][]: 実行結果とエラー
//!
//! # 使用例
//!
//! ```rust,ignore
//! use reg_horizon::engine::{GraphBuilder, GraphExecutor, PipelineState};
//!
//! let graph = GraphBuilder::new()
//!     .add_stage(router)
//!     .add_stage(scraper)
//!     .add_conditional_edges("router", route_of, [("web", "scraper")])
//!     .set_entry("router")
//!     .compile()?;
//!
//! let result = GraphExecutor::new("phase1_scan", graph)
//!     .run(PipelineState::from_pairs([("url", url.into())]))
//!     .await?;
//! println!("visited: {:?}", result.visited);
//! ```

pub mod context;
pub mod executor;
pub mod graph;
pub mod result;
pub mod stage;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;

// 公開APIの再エクスポート
pub use context::{ExecutionContext, StageTiming};
pub use executor::GraphExecutor;
pub use graph::{Decision, Edge, GraphBuilder, GraphError, PipelineGraph};
pub use result::{PipelineError, RunOutcome, RunResult, FINAL_OUTPUT_KEY};
pub use stage::{output_key, Stage};
pub use state::PipelineState;
