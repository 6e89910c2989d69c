//! テスト用のモックプロバイダー

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::ProviderError;
use super::traits::{CompletionRequest, ProviderClient, ProviderResponse, StopReason, TokenUsage};

/// 用意した応答を順に返すモック
///
/// `Err` を積むとその呼び出しは [`ProviderError::InvalidResponse`] になります。
/// 応答を使い切った後は入力をそのまま返します。
#[derive(Clone, Default)]
pub(crate) struct MockProviderClient {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProviderClient {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::scripted(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn scripted(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    async fn execute(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());

        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(request.user_input.clone())
            } else {
                responses.remove(0)
            }
        };

        let content = next.map_err(ProviderError::InvalidResponse)?;
        Ok(ProviderResponse {
            content,
            token_usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
            stop_reason: StopReason::EndTurn,
            model: "mock-model".to_string(),
        })
    }
}
