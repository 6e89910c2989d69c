//! reg-horizon
//!
//! 規制当局サイトの URL から規制アップデートの候補一覧を作り、
//! 分析者が選んだ行だけを LLM で要約するためのライブラリです。
//!
//! # モジュール構成
//!
//! - [`router`] - URL を `web` / `rss` に分類
//! - [`engine`] - ステージグラフの構築と実行
//! - [`pipeline`] - スキャンパイプライン（取得 → クリーニング → 抽出 → レコード化 → 除外判定）
//! - [`sheet`] - 行コレクション（CSV）の読み書き
//! - [`session`] - スキャン成果物からディスパッチへの受け渡し
//! - [`dispatch`] - 行アクションに応じた要約処理
//! - [`tool`] - 取得・整形・LLM 呼び出しなどの外部コラボレーター
//! - [`provider`] - LLM プロバイダークライアント
//! - [`config`] - TOML 設定
//! - [`logging`] - ログの初期化

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod router;
pub mod session;
pub mod sheet;
pub mod tool;
