//! パイプライングラフの構築と検証
//!
//! # 責務
//!
//! - 名前付きステージ・無条件エッジ・条件付きエッジ・開始ステージを登録する
//! - [`GraphBuilder::compile`] で構造を検証し、実行可能な [`PipelineGraph`] を作る
//!
//! # 検証内容
//!
//! 1. 開始ステージが設定済みで、登録済みのステージである
//! 2. ステージ名が重複していない
//! 3. すべてのエッジの両端が登録済みのステージである
//! 4. 各ステージの出口エッジは高々1組（無条件1本、または条件付き1組）
//! 5. 閉路がない（petgraph のトポロジカルソートで検出）
//!
//! # 使用例
//!
//! ```rust,ignore
//! let graph = GraphBuilder::new()
//!     .add_stage(router)
//!     .add_stage(scraper)
//!     .add_conditional_edges("router", route_of, [("web", "scraper")])
//!     .set_entry("router")
//!     .compile()?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use super::stage::Stage;
use super::state::PipelineState;

/// 条件付きエッジの判定関数（ラベルを返す）
pub type Decision = Arc<dyn Fn(&PipelineState) -> Option<String> + Send + Sync>;

/// グラフ構築エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// 開始ステージが未設定
    #[error("開始ステージが設定されていません")]
    MissingEntry,

    /// 未登録のステージを参照した
    #[error("ステージ '{0}' は登録されていません")]
    UnknownStage(String),

    /// 同名のステージを二重に登録した
    #[error("ステージ '{0}' が重複しています")]
    DuplicateStage(String),

    /// 1つのステージに複数の出口エッジを登録した
    #[error("ステージ '{0}' に複数の出口エッジが登録されています")]
    DuplicateEdges(String),

    /// 閉路を検出した
    #[error("ステージ '{0}' を含む閉路があります")]
    Cycle(String),
}

/// ステージの出口エッジ
#[derive(Clone)]
pub enum Edge {
    /// 常に同じステージへ進む
    Direct(String),
    /// 判定関数のラベルに応じて進む
    Conditional {
        decide: Decision,
        routes: BTreeMap<String, String>,
    },
}

impl Edge {
    fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(to) => vec![to.as_str()],
            Edge::Conditional { routes, .. } => routes.values().map(String::as_str).collect(),
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Edge::Conditional { routes, .. } => {
                f.debug_struct("Conditional").field("routes", routes).finish_non_exhaustive()
            }
        }
    }
}

/// グラフビルダー
#[derive(Default)]
pub struct GraphBuilder {
    stages: Vec<Arc<dyn Stage>>,
    edges: Vec<(String, Edge)>,
    entry: Option<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// ステージを登録する（名前は [`Stage::name`]）
    pub fn add_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// 無条件エッジを登録する
    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges.push((from.to_string(), Edge::Direct(to.to_string())));
        self
    }

    /// 条件付きエッジを登録する
    ///
    /// `decide` が返したラベルが `routes` にない場合、実行はそこで終了します。
    pub fn add_conditional_edges<'a, F>(
        mut self,
        from: &str,
        decide: F,
        routes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self
    where
        F: Fn(&PipelineState) -> Option<String> + Send + Sync + 'static,
    {
        let routes = routes
            .into_iter()
            .map(|(label, to)| (label.to_string(), to.to_string()))
            .collect();
        self.edges.push((
            from.to_string(),
            Edge::Conditional {
                decide: Arc::new(decide),
                routes,
            },
        ));
        self
    }

    /// 開始ステージを設定する
    pub fn set_entry(mut self, stage: &str) -> Self {
        self.entry = Some(stage.to_string());
        self
    }

    /// 構造を検証して実行可能なグラフを作る
    pub fn compile(self) -> Result<PipelineGraph, GraphError> {
        let mut stages: HashMap<String, Arc<dyn Stage>> = HashMap::new();
        let mut graph = DiGraph::<String, ()>::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();

        for stage in self.stages {
            let name = stage.name().to_string();
            if stages.contains_key(&name) {
                return Err(GraphError::DuplicateStage(name));
            }
            nodes.insert(name.clone(), graph.add_node(name.clone()));
            stages.insert(name, stage);
        }

        let entry = self.entry.ok_or(GraphError::MissingEntry)?;
        if !stages.contains_key(&entry) {
            return Err(GraphError::UnknownStage(entry));
        }

        let mut edges: HashMap<String, Edge> = HashMap::new();
        for (from, edge) in self.edges {
            let from_index = *nodes
                .get(&from)
                .ok_or_else(|| GraphError::UnknownStage(from.clone()))?;
            for to in edge.targets() {
                let to_index = *nodes
                    .get(to)
                    .ok_or_else(|| GraphError::UnknownStage(to.to_string()))?;
                graph.add_edge(from_index, to_index, ());
            }
            if edges.contains_key(&from) {
                return Err(GraphError::DuplicateEdges(from));
            }
            edges.insert(from, edge);
        }

        toposort(&graph, None).map_err(|cycle| GraphError::Cycle(graph[cycle.node_id()].clone()))?;

        Ok(PipelineGraph {
            stages,
            edges,
            entry,
        })
    }
}

/// 検証済みのパイプライングラフ
pub struct PipelineGraph {
    stages: HashMap<String, Arc<dyn Stage>>,
    edges: HashMap<String, Edge>,
    entry: String,
}

impl fmt::Debug for PipelineGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stages: Vec<&str> = self.stages.keys().map(String::as_str).collect();
        stages.sort_unstable();
        let edges: BTreeMap<&str, &Edge> = self.edges.iter().map(|(from, edge)| (from.as_str(), edge)).collect();
        f.debug_struct("PipelineGraph")
            .field("entry", &self.entry)
            .field("stages", &stages)
            .field("edges", &edges)
            .finish()
    }
}

impl PipelineGraph {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn stage(&self, name: &str) -> Option<&Arc<dyn Stage>> {
        self.stages.get(name)
    }

    pub fn edge(&self, from: &str) -> Option<&Edge> {
        self.edges.get(from)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::EchoStage;

    fn stage(name: &str) -> Arc<dyn Stage> {
        Arc::new(EchoStage::new(name))
    }

    #[test]
    fn test_compile_valid_graph() {
        let graph = GraphBuilder::new()
            .add_stage(stage("a"))
            .add_stage(stage("b"))
            .add_stage(stage("c"))
            .add_conditional_edges("a", |_| Some("x".to_string()), [("x", "b")])
            .add_edge("b", "c")
            .set_entry("a")
            .compile()
            .unwrap();

        assert_eq!(graph.entry(), "a");
        assert_eq!(graph.stage_count(), 3);
        assert!(matches!(graph.edge("b"), Some(Edge::Direct(to)) if to == "c"));
        assert!(graph.edge("c").is_none());
    }

    #[test]
    fn test_missing_and_unknown_entry() {
        let err = GraphBuilder::new().add_stage(stage("a")).compile().unwrap_err();
        assert_eq!(err, GraphError::MissingEntry);

        let err = GraphBuilder::new().add_stage(stage("a")).set_entry("z").compile().unwrap_err();
        assert_eq!(err, GraphError::UnknownStage("z".to_string()));
    }

    #[test]
    fn test_unknown_edge_target() {
        let err = GraphBuilder::new()
            .add_stage(stage("a"))
            .add_conditional_edges("a", |_| None, [("web", "scraper")])
            .set_entry("a")
            .compile()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownStage("scraper".to_string()));
    }

    #[test]
    fn test_duplicate_stage_and_edges() {
        let err = GraphBuilder::new()
            .add_stage(stage("a"))
            .add_stage(stage("a"))
            .set_entry("a")
            .compile()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateStage("a".to_string()));

        let err = GraphBuilder::new()
            .add_stage(stage("a"))
            .add_stage(stage("b"))
            .add_edge("a", "b")
            .add_conditional_edges("a", |_| None, [("x", "b")])
            .set_entry("a")
            .compile()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateEdges("a".to_string()));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = GraphBuilder::new()
            .add_stage(stage("a"))
            .add_stage(stage("b"))
            .add_edge("a", "b")
            .add_conditional_edges("b", |_| Some("again".into()), [("again", "a")])
            .set_entry("a")
            .compile()
            .unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }
}
