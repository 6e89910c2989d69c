//! パイプラインステージのインターフェース

use async_trait::async_trait;

use crate::error::StageError;
use crate::tool::Payload;
use super::state::PipelineState;

/// グラフの1ノード
///
/// # 契約
///
/// - [`reads`](Stage::reads) に宣言したキーだけを状態から読む
/// - 状態を直接変更せず、部分更新を返す
/// - 返す部分更新のキーは [`writes`](Stage::writes) に宣言したものに限る
///
/// 実行エンジンは呼び出し前に読み取りキーの存在を、呼び出し後に書き込みキーを検査します。
#[async_trait]
pub trait Stage: Send + Sync {
    /// ステージ名（グラフ内で一意）
    fn name(&self) -> &str;

    /// 読み取るキー
    fn reads(&self) -> Vec<String>;

    /// 書き込むキー
    fn writes(&self) -> Vec<String>;

    /// 現在の状態を受け取り、部分更新を返す
    async fn run(&self, state: &PipelineState) -> Result<Payload, StageError>;
}

/// ステージ出力のキー名（`<stage>_output`）
pub fn output_key(stage: &str) -> String {
    format!("{stage}_output")
}
