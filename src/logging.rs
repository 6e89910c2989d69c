//! ログの初期化
//!
//! # 責務
//!
//! `tracing-subscriber` のレジストリを構築します。
//!
//! - `RUST_LOG` が設定されていればそれを、なければ `--log-level` の値をフィルタに使う
//! - 人間向けの出力は標準エラーへ
//! - ログディレクトリが指定された場合は JSON 形式で日次ローテーションのファイルにも書き出す

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::LoggingError;

/// ログファイル名の接頭辞
const LOG_FILE_PREFIX: &str = "reg-horizon.log";

/// フィルタを決める（`RUST_LOG` 優先）
fn env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|source| LoggingError::InvalidLevel {
            level: level.to_string(),
            source,
        }),
    }
}

/// ログを初期化する
///
/// ファイル出力を有効にした場合は [`WorkerGuard`] を返します。
/// ガードを破棄するとバッファ済みのログが書き出されなくなるため、
/// プロセス終了まで保持してください。
pub fn init(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = env_filter(level)?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().json().with_writer(writer);

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(None)
        }
    }
}
