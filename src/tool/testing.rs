//! テスト用のツール

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::ToolError;
use super::traits::{Payload, Tool, ToolKind};

/// 入力を記録し、固定の応答（または失敗）を返すツール
pub(crate) struct StubTool {
    pub name: &'static str,
    pub reply: Result<Payload, String>,
    pub calls: Arc<Mutex<Vec<Payload>>>,
    /// 複数のツールで共有する呼び出し順の記録
    pub log: Option<Arc<Mutex<Vec<&'static str>>>>,
}

impl StubTool {
    pub fn ok(name: &'static str, reply: Payload) -> Self {
        Self {
            name,
            reply: Ok(reply),
            calls: Arc::new(Mutex::new(Vec::new())),
            log: None,
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            reply: Err(format!("{name} failed")),
            calls: Arc::new(Mutex::new(Vec::new())),
            log: None,
        }
    }

    pub fn with_log(mut self, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
        self.log = Some(log.clone());
        self
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Extractor
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        self.calls.lock().unwrap().push(inputs.clone());
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name);
        }
        self.reply.clone().map_err(ToolError::Timeout)
    }
}
