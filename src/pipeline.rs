//! 規制サイトのスキャンパイプライン
//!
//! # 責務
//!
//! ルーター・ツール・除外判定をステージとしてグラフに組み立て、
//! URL から除外判定済みの行コレクション（CSV）を作ります。
//!
//! # グラフ
//!
//! ```text
//! router ──web──▶ scraper ─▶ cleaner ─▶ html_extractor ─▶ llm_extractor ─▶ exclusion
//!    └──rss──▶（対応ステージなし: UnmappedRoute で終了）
//! ```
//!
//! 各ステージは `<stage>_output` に出力を書き込み、最後の `exclusion` が
//! `final_output: {output_reference, data}` を書き込みます。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::info;

use crate::config::Settings;
use crate::engine::{
    output_key, GraphBuilder, GraphError, GraphExecutor, PipelineError, PipelineGraph, PipelineState,
    RunResult, Stage, FINAL_OUTPUT_KEY,
};
use crate::error::StageError;
use crate::model::UpdateRecord;
use crate::router::{Route, Router};
use crate::sheet::RowSet;
use crate::tool::{payload, Payload, Tool, Toolkit};

/// ステージ名
pub mod stages {
    pub const ROUTER: &str = "router";
    pub const SCRAPER: &str = "scraper";
    pub const CLEANER: &str = "cleaner";
    pub const HTML_EXTRACTOR: &str = "html_extractor";
    pub const LLM_EXTRACTOR: &str = "llm_extractor";
    pub const EXCLUSION: &str = "exclusion";
}

/// ルーターを包むステージ
///
/// 初期状態の `route` は上書きされます。
pub struct RouterStage {
    router: Router,
}

impl RouterStage {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Stage for RouterStage {
    fn name(&self) -> &str {
        stages::ROUTER
    }

    fn reads(&self) -> Vec<String> {
        vec!["url".to_string()]
    }

    fn writes(&self) -> Vec<String> {
        vec!["route".to_string(), output_key(stages::ROUTER)]
    }

    async fn run(&self, state: &PipelineState) -> Result<Payload, StageError> {
        let url = state_url(state)?;
        let route = self.router.route(url).await;
        info!(url, %route, "ルートを決定しました");
        let key = output_key(stages::ROUTER);
        Ok(payload([
            ("route", json!(route)),
            (key.as_str(), json!({"route": route})),
        ]))
    }
}

/// ツールを1回呼び出すステージ
///
/// 入力は `url` と、直前のステージの出力（`<upstream>_output`）のフィールドです。
pub struct ToolStage {
    name: String,
    tool: Arc<dyn Tool>,
    upstream: Option<String>,
}

impl ToolStage {
    pub fn new(name: &str, tool: Arc<dyn Tool>) -> Self {
        Self {
            name: name.to_string(),
            tool,
            upstream: None,
        }
    }

    /// 入力として読む直前のステージを指定する
    pub fn after(mut self, upstream: &str) -> Self {
        self.upstream = Some(upstream.to_string());
        self
    }
}

#[async_trait]
impl Stage for ToolStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn reads(&self) -> Vec<String> {
        let mut keys = vec!["url".to_string()];
        keys.extend(self.upstream.as_deref().map(output_key));
        keys
    }

    fn writes(&self) -> Vec<String> {
        vec![output_key(&self.name)]
    }

    async fn run(&self, state: &PipelineState) -> Result<Payload, StageError> {
        let inputs = stage_inputs(state, self.upstream.as_deref())?;
        info!(stage = %self.name, tool = self.tool.name(), "ツールを実行します");
        let output = self.tool.run(&inputs).await?;
        let key = output_key(&self.name);
        Ok(payload([(key.as_str(), Value::Object(output))]))
    }
}

/// 除外判定を行い、成果物を書き出すステージ
pub struct ExclusionStage {
    tool: Arc<dyn Tool>,
    upstream: String,
    output_dir: Option<PathBuf>,
}

impl ExclusionStage {
    /// `output_dir` が `None` の場合は成果物を書き出さず、`output_reference` は空文字になります
    pub fn new(tool: Arc<dyn Tool>, upstream: &str, output_dir: Option<PathBuf>) -> Self {
        Self {
            tool,
            upstream: upstream.to_string(),
            output_dir,
        }
    }

    fn write_artifact(&self, dir: &Path, url: &str, records: &Value) -> Result<PathBuf, StageError> {
        let records: Vec<UpdateRecord> =
            serde_json::from_value(records.clone()).map_err(|e| StageError::InvalidState {
                key: "filtered_records".to_string(),
                reason: e.to_string(),
            })?;
        let path = dir.join(artifact_file_name(url, &Local::now().format("%Y%m%d_%H%M%S").to_string()));
        RowSet::from_records(records).save(&path)?;
        Ok(path)
    }
}

#[async_trait]
impl Stage for ExclusionStage {
    fn name(&self) -> &str {
        stages::EXCLUSION
    }

    fn reads(&self) -> Vec<String> {
        vec!["url".to_string(), output_key(&self.upstream)]
    }

    fn writes(&self) -> Vec<String> {
        vec![output_key(stages::EXCLUSION), FINAL_OUTPUT_KEY.to_string()]
    }

    async fn run(&self, state: &PipelineState) -> Result<Payload, StageError> {
        let url = state_url(state)?;
        let inputs = stage_inputs(state, Some(&self.upstream))?;
        let output = self.tool.run(&inputs).await?;

        let records = output.get("filtered_records").cloned().unwrap_or_else(|| json!([]));
        let reference = match &self.output_dir {
            Some(dir) => {
                let path = self.write_artifact(dir, url, &records)?;
                info!(path = %path.display(), "成果物を書き出しました");
                path.display().to_string()
            }
            None => String::new(),
        };

        let key = output_key(stages::EXCLUSION);
        Ok(payload([
            (key.as_str(), Value::Object(output)),
            (
                FINAL_OUTPUT_KEY,
                json!({"output_reference": reference, "data": records}),
            ),
        ]))
    }
}

fn state_url(state: &PipelineState) -> Result<&str, StageError> {
    state.get_str("url").ok_or_else(|| StageError::InvalidState {
        key: "url".to_string(),
        reason: "文字列ではありません".to_string(),
    })
}

/// `url` と直前のステージ出力からツール入力を作る
fn stage_inputs(state: &PipelineState, upstream: Option<&str>) -> Result<Payload, StageError> {
    let mut inputs = payload([("url", json!(state_url(state)?))]);
    if let Some(upstream) = upstream {
        let key = output_key(upstream);
        match state.get(&key) {
            Some(Value::Object(fields)) => inputs.extend(fields.clone()),
            _ => {
                return Err(StageError::InvalidState {
                    key,
                    reason: "オブジェクトではありません".to_string(),
                });
            }
        }
    }
    Ok(inputs)
}

/// 成果物のファイル名（`<ドメイン>_llm_exclusion_checked_<時刻>.csv`）
///
/// ```rust
/// use reg_horizon::pipeline::artifact_file_name;
///
/// assert_eq!(
///     artifact_file_name("https://www.bis.org/press/pressrels.htm", "20250512_093000"),
///     "www_bis_org_llm_exclusion_checked_20250512_093000.csv"
/// );
/// ```
pub fn artifact_file_name(url: &str, timestamp: &str) -> String {
    let domain = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|host| match u.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        })
        .unwrap_or_else(|| "site".to_string())
        .replace(['.', ':'], "_");
    format!("{domain}_llm_exclusion_checked_{timestamp}.csv")
}

fn route_label(state: &PipelineState) -> Option<String> {
    state.get_str("route").map(str::to_string)
}

/// スキャンパイプラインのグラフを組み立てる
///
/// `rss` ルートには対応ステージを登録しません。
pub fn build_scan_graph(
    router: Router,
    toolkit: &Toolkit,
    output_dir: Option<PathBuf>,
) -> Result<PipelineGraph, GraphError> {
    use stages::*;

    GraphBuilder::new()
        .add_stage(Arc::new(RouterStage::new(router)))
        .add_stage(Arc::new(ToolStage::new(SCRAPER, toolkit.fetcher.clone())))
        .add_stage(Arc::new(ToolStage::new(CLEANER, toolkit.cleaner.clone()).after(SCRAPER)))
        .add_stage(Arc::new(
            ToolStage::new(HTML_EXTRACTOR, toolkit.extractor.clone()).after(CLEANER),
        ))
        .add_stage(Arc::new(
            ToolStage::new(LLM_EXTRACTOR, toolkit.record_extractor.clone()).after(HTML_EXTRACTOR),
        ))
        .add_stage(Arc::new(ExclusionStage::new(
            toolkit.exclusion.clone(),
            LLM_EXTRACTOR,
            output_dir,
        )))
        .add_conditional_edges(ROUTER, route_label, [(Route::Web.as_str(), SCRAPER)])
        .add_edge(SCRAPER, CLEANER)
        .add_edge(CLEANER, HTML_EXTRACTOR)
        .add_edge(HTML_EXTRACTOR, LLM_EXTRACTOR)
        .add_edge(LLM_EXTRACTOR, EXCLUSION)
        .set_entry(ROUTER)
        .compile()
}

/// スキャンパイプライン
pub struct ScanPipeline {
    executor: GraphExecutor,
}

impl ScanPipeline {
    /// ツール一式と設定からパイプラインを組み立てる
    pub fn new(toolkit: &Toolkit, settings: &Settings) -> Result<Self, GraphError> {
        let router = Router::new(
            toolkit.fetcher.clone(),
            toolkit.route_classifier.clone(),
            settings.fetch.preview_chars,
        );
        let graph = build_scan_graph(router, toolkit, settings.output.dir.clone())?;
        Ok(Self {
            executor: GraphExecutor::new("phase1_scan", graph),
        })
    }

    /// URL をスキャンする
    pub async fn run(&self, url: &str) -> Result<RunResult, PipelineError> {
        let initial = PipelineState::from_pairs([("url", json!(url)), ("route", json!(Route::Web))]);
        self.executor.run(initial).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::engine::RunOutcome;
    use crate::tool::testing::StubTool;

    fn toolkit(exclusion: StubTool) -> Toolkit {
        Toolkit {
            fetcher: Arc::new(StubTool::ok("fetcher", payload([("url", json!("https://www.bis.org/press")), ("raw_content", json!("<html>"))]))),
            cleaner: Arc::new(StubTool::ok("cleaner", payload([("cleaned_content", json!("<p>x</p>"))]))),
            extractor: Arc::new(StubTool::ok("extractor", payload([("extracted_text", json!("x"))]))),
            record_extractor: Arc::new(StubTool::ok(
                "record_extractor",
                payload([("extracted_records", json!([{"topic": "T", "link": "https://www.bis.org/p1"}]))]),
            )),
            exclusion: Arc::new(exclusion),
            route_classifier: Arc::new(StubTool::ok("route_classifier", payload([("route", json!("web"))]))),
            summarizer: Arc::new(StubTool::failing("summarizer")),
        }
    }

    fn exclusion_stub() -> StubTool {
        StubTool::ok(
            "exclusion",
            payload([(
                "filtered_records",
                json!([{"topic": "T", "link": "https://www.bis.org/p1", "recommendation": "Include", "reason": "r"}]),
            )]),
        )
    }

    fn settings(dir: Option<PathBuf>) -> Settings {
        let mut settings = Settings::default();
        settings.output.dir = dir;
        settings
    }

    /// web ルートで全ステージを順に訪問し、exclusion の時点で上流の出力が揃っていること
    #[tokio::test]
    async fn test_web_scan_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let exclusion = exclusion_stub();
        let exclusion_calls = exclusion.calls.clone();
        let pipeline = ScanPipeline::new(&toolkit(exclusion), &settings(Some(dir.path().to_path_buf()))).unwrap();

        let result = pipeline.run("https://www.bis.org/press").await.unwrap();

        assert_eq!(result.outcome, RunOutcome::Completed);
        assert_eq!(
            result.visited,
            vec!["router", "scraper", "cleaner", "html_extractor", "llm_extractor", "exclusion"]
        );
        for key in ["route", "scraper_output", "cleaner_output", "html_extractor_output", "llm_extractor_output"] {
            assert!(result.state.contains(key), "{key}");
        }

        let exclusion_inputs = &exclusion_calls.lock().unwrap()[0];
        assert_eq!(exclusion_inputs["url"], json!("https://www.bis.org/press"));
        assert!(exclusion_inputs.contains_key("extracted_records"));

        let path = result.output_reference().unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("www_bis_org_llm_exclusion_checked_"));
        let saved = RowSet::load(&path).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved.rows()[0].extras["Recommendation"], "Include");
        assert_eq!(saved.rows()[0].action_text(), "no action");
    }

    /// rss ルートは未対応のため router のみ訪問して終了すること
    #[tokio::test]
    async fn test_rss_route_dead_ends() {
        let exclusion = exclusion_stub();
        let exclusion_calls = exclusion.calls.clone();
        let pipeline = ScanPipeline::new(&toolkit(exclusion), &settings(None)).unwrap();

        let result = pipeline.run("https://www.fca.org.uk/news/rss.xml").await.unwrap();

        assert_eq!(
            result.outcome,
            RunOutcome::UnmappedRoute {
                stage: "router".into(),
                label: "rss".into()
            }
        );
        assert_eq!(result.visited, vec!["router"]);
        assert_eq!(result.state.get_str("route"), Some("rss"));
        assert!(exclusion_calls.lock().unwrap().is_empty());
        assert_eq!(result.output_reference(), None);
    }

    #[tokio::test]
    async fn test_without_output_dir_reference_is_empty() {
        let pipeline = ScanPipeline::new(&toolkit(exclusion_stub()), &settings(None)).unwrap();
        let result = pipeline.run("https://www.bis.org/press").await.unwrap();

        assert_eq!(result.state.get(FINAL_OUTPUT_KEY).unwrap()["output_reference"], json!(""));
        assert_eq!(result.state.get(FINAL_OUTPUT_KEY).unwrap()["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stage_failure_aborts_scan() {
        let pipeline = ScanPipeline::new(&toolkit(StubTool::failing("exclusion")), &settings(None)).unwrap();
        let err = pipeline.run("https://www.bis.org/press").await.unwrap_err();
        assert!(matches!(err, PipelineError::Stage { ref stage, .. } if stage == "exclusion"));
    }

    #[test]
    fn test_artifact_name_without_host() {
        assert_eq!(artifact_file_name("not a url", "t"), "site_llm_exclusion_checked_t.csv");
        assert_eq!(
            artifact_file_name("http://localhost:8080/x", "t"),
            "localhost_8080_llm_exclusion_checked_t.csv"
        );
    }
}
