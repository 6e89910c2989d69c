//! エラー型の定義
//!
//! このモジュールは、reg-horizon 全体で使用されるエラー型を定義します。
//!
//! # エラーの扱い
//!
//! | 種別 | 型 | 扱い |
//! |------|----|------|
//! | ルーティング失敗 | （型なし） | [`Router`](crate::router::Router) 内で既定ルートに回復 |
//! | ステージ失敗 | [`PipelineError`](crate::engine::PipelineError) | 実行全体を中断し呼び出し元へ伝播 |
//! | 成果物の欠落 | [`SessionError::MissingArtifact`] | 必要になった時点で致命的 |
//! | 行処理の失敗 | [`ToolError`] | ディスパッチャーが行の出力へ書き込み、処理を継続 |

use std::path::PathBuf;

use thiserror::Error;

/// 設定関連のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ファイルの読み込みに失敗
    #[error("設定ファイルの読み込みに失敗しました: {0}")]
    FileRead(#[from] std::io::Error),

    /// TOML のデシリアライズに失敗
    #[error("TOML のデシリアライズに失敗しました: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    /// TOML のシリアライズに失敗
    #[error("TOML のシリアライズに失敗しました: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// バリデーションエラー
    #[error("設定のバリデーションに失敗しました: {0}")]
    Validation(String),

    /// APIキー用の環境変数が未設定
    #[error("環境変数 {0} が設定されていません")]
    MissingApiKey(String),
}

/// LLMプロバイダー関連のエラー
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 認証失敗（APIキー不正など）
    #[error("認証に失敗しました: {0}")]
    AuthenticationError(String),

    /// レート制限超過
    #[error("レート制限を超過しました")]
    RateLimitExceeded,

    /// タイムアウト
    #[error("LLM呼び出しがタイムアウトしました: {0}")]
    Timeout(String),

    /// APIがエラーステータスを返した
    #[error("APIエラー (HTTP {status}): {message}")]
    ApiError {
        /// HTTPステータスコード
        status: u16,
        /// レスポンス本文
        message: String,
    },

    /// 不正なレスポンス
    #[error("不正なレスポンスです: {0}")]
    InvalidResponse(String),

    /// HTTP通信エラー
    #[error("HTTP通信に失敗しました: {0}")]
    Http(#[from] reqwest::Error),

    /// クライアント構築時の設定エラー
    #[error("プロバイダー設定エラー: {0}")]
    Config(String),
}

/// 外部コラボレーター（ツール）のエラー
///
/// ツールは自らリトライしません。ここで返されたエラーの扱いは
/// 呼び出し側（実行エンジンまたはディスパッチャー）が決めます。
#[derive(Debug, Error)]
pub enum ToolError {
    /// 必須入力キーが欠落
    #[error("ツール '{tool}' の入力 '{key}' がありません")]
    MissingInput {
        /// ツール名
        tool: String,
        /// 欠落したキー
        key: String,
    },

    /// 取得先がエラーステータスを返した
    #[error("{url} の取得に失敗しました (HTTP {status})")]
    Status {
        /// 取得対象URL
        url: String,
        /// HTTPステータスコード
        status: u16,
    },

    /// タイムアウト
    #[error("タイムアウト: {0}")]
    Timeout(String),

    /// HTTP通信エラー
    #[error("HTTP通信に失敗しました: {0}")]
    Http(#[from] reqwest::Error),

    /// LLMプロバイダーのエラー
    #[error("LLM呼び出しに失敗しました: {0}")]
    Provider(#[from] ProviderError),

    /// ツールの出力を解釈できない
    #[error("ツール '{tool}' の出力が不正です: {reason}")]
    InvalidOutput {
        /// ツール名
        tool: String,
        /// 理由
        reason: String,
    },
}

/// パイプラインステージのエラー
#[derive(Debug, Error)]
pub enum StageError {
    /// ステージが呼び出したツールの失敗
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// 成果物の書き出しの失敗
    #[error("成果物を書き出せません: {0}")]
    Artifact(#[from] SheetError),

    /// 状態の値が想定した形をしていない
    #[error("状態キー '{key}' の値が不正です: {reason}")]
    InvalidState {
        /// 状態キー
        key: String,
        /// 理由
        reason: String,
    },
}

/// 行コレクション（CSV）の読み書きエラー
#[derive(Debug, Error)]
pub enum SheetError {
    /// ファイル入出力の失敗
    #[error("ファイル入出力に失敗しました: {0}")]
    Io(#[from] std::io::Error),

    /// CSV の読み書きの失敗
    #[error("CSV の処理に失敗しました: {0}")]
    Csv(#[from] csv::Error),

    /// 必須列の欠落
    #[error("必須列 '{0}' がありません")]
    MissingColumn(String),

    /// 同じフィールドに対応する列が複数ある
    #[error("列 '{0}' が重複しています")]
    DuplicateColumn(String),

    /// ヘッダーより多いセルを持つ行
    #[error("{line} 行目のセル数 {cells} がヘッダーの列数 {columns} を超えています")]
    RowTooWide {
        /// CSV 上の行番号（1始まり）
        line: u64,
        /// セル数
        cells: usize,
        /// ヘッダーの列数
        columns: usize,
    },
}

/// セッション関連のエラー
#[derive(Debug, Error)]
pub enum SessionError {
    /// パイプラインが成果物の参照を返さなかった
    #[error("パイプラインの成果物が見つかりません")]
    MissingArtifact,

    /// 参照先のファイルが存在しない
    #[error("成果物ファイルが存在しません: {0}")]
    ArtifactNotFound(PathBuf),

    /// 行コレクションの読み書きエラー
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// ログ初期化のエラー
#[derive(Debug, Error)]
pub enum LoggingError {
    /// フィルタ指定を解釈できない
    #[error("ログレベル '{level}' を解釈できません: {source}")]
    InvalidLevel {
        /// 指定されたフィルタ
        level: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// グローバルサブスクライバーの登録に失敗
    #[error("ログを初期化できません: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),

    /// ログディレクトリを作成できない
    #[error("ログディレクトリを作成できません: {0}")]
    Io(#[from] std::io::Error),
}

/// CLI 全体のエラー
#[derive(Debug, Error)]
pub enum Error {
    /// 設定エラー
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// プロバイダーエラー
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// ツールエラー
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// グラフ構築エラー
    #[error(transparent)]
    Graph(#[from] crate::engine::GraphError),

    /// パイプライン実行エラー
    #[error(transparent)]
    Pipeline(#[from] crate::engine::PipelineError),

    /// 行コレクションエラー
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// セッションエラー
    #[error(transparent)]
    Session(#[from] SessionError),

    /// ログ初期化エラー
    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// JSON 出力エラー
    #[error("JSON の生成に失敗しました: {0}")]
    Json(#[from] serde_json::Error),
}
