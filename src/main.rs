use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use reg_horizon::config::Settings;
use reg_horizon::dispatch::RowDispatcher;
use reg_horizon::engine::RunOutcome;
use reg_horizon::error::Error;
use reg_horizon::logging;
use reg_horizon::pipeline::ScanPipeline;
use reg_horizon::provider::create_provider;
use reg_horizon::router::Router;
use reg_horizon::session::Session;
use reg_horizon::tool::Toolkit;

#[derive(Parser)]
#[command(
    name = "reg-horizon",
    version,
    about = "規制アップデートのスキャンと行単位の要約"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 設定ファイル（TOML）。省略時は既定値
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// ログレベル (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// JSON ログの出力先ディレクトリ
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// URL のルートを表示する
    Route {
        url: String,
    },
    /// URL をスキャンして候補一覧を書き出す
    Scan {
        url: String,
        /// 成果物の出力先（設定ファイルの値より優先）
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// 実行結果を JSON で表示する
        #[arg(long)]
        json: bool,
    },
    /// 行コレクションのアクションを処理する
    Dispatch {
        /// 行コレクション（CSV）
        sheet: PathBuf,
        /// 保存先（省略時は入力ファイルへ上書き）
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match logging::init(&cli.log_level, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "実行に失敗しました");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    let client = create_provider(&settings.llm)?;

    match cli.command {
        Commands::Route { url } => {
            let toolkit = Toolkit::from_settings(&settings, client)?;
            let router = Router::new(
                toolkit.fetcher.clone(),
                toolkit.route_classifier.clone(),
                settings.fetch.preview_chars,
            );
            println!("{}", router.route(&url).await);
        }
        Commands::Scan { url, out_dir, json } => {
            if let Some(dir) = out_dir {
                settings.output.dir = Some(dir);
            }
            let toolkit = Toolkit::from_settings(&settings, client)?;
            let pipeline = ScanPipeline::new(&toolkit, &settings)?;
            let result = pipeline.run(&url).await?;

            if json {
                println!("{}", result.to_json()?);
                return Ok(());
            }
            match &result.outcome {
                RunOutcome::Completed => println!("completed: {}", result.visited.join(" -> ")),
                RunOutcome::UnmappedRoute { stage, label } => {
                    println!("stopped at {stage}: route '{label}' is not supported");
                }
            }
            let mut session = Session::new();
            session.record_scan(&url, &result);
            match session.artifact() {
                Some(path) => println!("artifact: {}", path.display()),
                None => println!("artifact: (none)"),
            }
        }
        Commands::Dispatch { sheet, out } => {
            let toolkit = Toolkit::from_settings(&settings, client)?;
            let dispatcher = RowDispatcher::from_toolkit(&toolkit);

            let mut session = Session::new().with_artifact(&sheet);
            let rows = session.rows_mut()?;
            let report = dispatcher.dispatch(rows.rows()).await;
            report.apply(rows.rows_mut());

            let saved = session.save_rows(out.as_deref())?;
            info!(path = %saved.display(), "行コレクションを保存しました");
            println!(
                "processed: {}, skipped: {}, reused: {}, failed: {}",
                report.processed, report.skipped, report.reused, report.failed
            );
            println!("saved: {}", saved.display());
        }
    }

    Ok(())
}
