//! テスト用のステージ

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::error::{StageError, ToolError};
use crate::tool::Payload;
use super::stage::{output_key, Stage};
use super::state::PipelineState;

/// 固定の出力を返すステージ
///
/// 既定では `<name>_output` に自分の名前を書き込みます。
pub(crate) struct EchoStage {
    name: String,
    reads: Vec<String>,
    writes: Option<Vec<String>>,
    output: Payload,
    fail: bool,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl EchoStage {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reads: Vec::new(),
            writes: None,
            output: [(output_key(name), json!(name))].into_iter().collect(),
            fail: false,
            log: None,
        }
    }

    pub fn with_reads(mut self, keys: &[&str]) -> Self {
        self.reads = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_writes(mut self, keys: &[&str]) -> Self {
        self.writes = Some(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn with_output(mut self, output: Payload) -> Self {
        self.output = output;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_log(mut self, log: &Arc<Mutex<Vec<String>>>) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }
}

#[async_trait]
impl Stage for EchoStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn reads(&self) -> Vec<String> {
        self.reads.clone()
    }

    fn writes(&self) -> Vec<String> {
        self.writes
            .clone()
            .unwrap_or_else(|| self.output.keys().cloned().collect())
    }

    async fn run(&self, _state: &PipelineState) -> Result<Payload, StageError> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }
        if self.fail {
            return Err(ToolError::Timeout(self.name.clone()).into());
        }
        Ok(self.output.clone())
    }
}
