//! スキャンからディスパッチへの受け渡し
//!
//! # 責務
//!
//! パイプラインが返した成果物の参照を保持し、ディスパッチャーが使う行コレクションを読み込みます。
//! 成果物は更新時刻で探さず、実行結果が明示的に返したパスだけを使います。

use std::path::{Path, PathBuf};

use tracing::info;

use crate::engine::RunResult;
use crate::error::SessionError;
use crate::sheet::RowSet;

/// 呼び出し側が所有するセッション
#[derive(Debug, Default)]
pub struct Session {
    url: Option<String>,
    artifact: Option<PathBuf>,
    rows: Option<RowSet>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// スキャン結果を記録する
    ///
    /// 以前に読み込んだ行コレクションは破棄します。
    pub fn record_scan(&mut self, url: &str, result: &RunResult) {
        self.url = Some(url.to_string());
        self.artifact = result.output_reference();
        self.rows = None;
    }

    /// 既存の成果物ファイルを直接指定する
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact = Some(path.into());
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    /// 成果物から行コレクションを読み込む（読み込み済みならそれを返す）
    ///
    /// # エラー
    ///
    /// - [`SessionError::MissingArtifact`] - 成果物の参照がない
    /// - [`SessionError::ArtifactNotFound`] - 参照先のファイルがない
    pub fn rows_mut(&mut self) -> Result<&mut RowSet, SessionError> {
        if self.rows.is_none() {
            let path = self.artifact.as_ref().ok_or(SessionError::MissingArtifact)?;
            if !path.exists() {
                return Err(SessionError::ArtifactNotFound(path.clone()));
            }
            let rows = RowSet::load(path)?;
            info!(path = %path.display(), rows = rows.len(), "行コレクションを読み込みました");
            self.rows = Some(rows);
        }
        self.rows.as_mut().ok_or(SessionError::MissingArtifact)
    }

    /// 行コレクションを保存する（`path` が `None` なら成果物へ上書き）
    pub fn save_rows(&self, path: Option<&Path>) -> Result<PathBuf, SessionError> {
        let rows = self.rows.as_ref().ok_or(SessionError::MissingArtifact)?;
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.artifact.clone())
            .ok_or(SessionError::MissingArtifact)?;
        rows.save(&target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    use serde_json::json;

    use crate::engine::{PipelineState, RunOutcome, FINAL_OUTPUT_KEY};

    fn run_result(reference: &str) -> RunResult {
        RunResult {
            outcome: RunOutcome::Completed,
            visited: vec![],
            state: PipelineState::from_pairs([(FINAL_OUTPUT_KEY, json!({"output_reference": reference}))]),
            timings: vec![],
            start_time: SystemTime::now(),
            total_duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_empty_reference_is_missing_artifact() {
        let mut session = Session::new();
        session.record_scan("https://x.test", &run_result(""));

        assert_eq!(session.url(), Some("https://x.test"));
        assert!(matches!(session.rows_mut(), Err(SessionError::MissingArtifact)));
    }

    #[test]
    fn test_nonexistent_artifact() {
        let mut session = Session::new().with_artifact("/nonexistent/a.csv");
        assert!(matches!(session.rows_mut(), Err(SessionError::ArtifactNotFound(_))));
    }

    #[test]
    fn test_load_edit_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.csv");
        std::fs::write(&path, "topic,Link,action\nA,https://x.test/a,no action\n").unwrap();

        let mut session = Session::new();
        session.record_scan("https://x.test", &run_result(&path.display().to_string()));
        session.rows_mut().unwrap().rows_mut()[0].output = "S1".to_string();

        let saved = session.save_rows(None).unwrap();
        assert_eq!(saved, path);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "topic,Link,action,output\nA,https://x.test/a,no action,S1\n"
        );
    }
}
