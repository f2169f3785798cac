mod sync;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use steamsync_db::{PgStore, PoolConfig, SyncStore};
use steamsync_sources::{ClientSettings, RateLimits, SteamClients};

use crate::sync::{RunOptions, Worker};

#[derive(Debug, Parser)]
#[command(name = "steamsync")]
#[command(about = "Steam game-data ingestion workers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync worker to completion
    Sync {
        #[arg(value_enum)]
        worker: Worker,

        /// Number of due apps to process (worker default when unset)
        #[arg(long, env = "BATCH_SIZE")]
        batch_size: Option<i32>,

        /// External orchestration run id recorded on the job
        #[arg(long, env = "GITHUB_RUN_ID")]
        run_id: Option<String>,
    },
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Inspect the sync job log
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },
    /// Print one app's sync state
    Status { appid: i32 },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[derive(Debug, Subcommand)]
enum JobsCommands {
    /// List the most recent jobs, newest first
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("steamsync: pass a subcommand, see --help");
        return Ok(());
    };

    let config = steamsync_core::load_app_config().context("failed to load configuration")?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = steamsync_db::connect_pool(&config.database_url, PoolConfig::from_app_config(&config))
        .await
        .context("failed to connect to database")?;

    match command {
        Commands::Sync {
            worker,
            batch_size,
            run_id,
        } => {
            let clients = SteamClients::new(
                &ClientSettings::from_app_config(&config),
                &RateLimits::steam_defaults(),
                config.steam_api_key.clone(),
            )?;
            let store = PgStore::new(pool);
            let options = RunOptions { batch_size, run_id };
            sync::run_worker(&store, &clients, worker, &options).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Migrate => {
                let applied = steamsync_db::run_migrations(&pool).await?;
                println!("applied {applied} migrations");
            }
            DbCommands::Ping => {
                steamsync_db::ping(&pool).await?;
                println!("database reachable");
            }
        },
        Commands::Jobs {
            command: JobsCommands::List { limit },
        } => print_jobs(&pool, limit).await?,
        Commands::Status { appid } => print_status(&PgStore::new(pool), appid).await?,
    }

    Ok(())
}

async fn print_jobs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let jobs = steamsync_db::list_jobs(pool, limit).await?;
    if jobs.is_empty() {
        println!("no sync jobs recorded");
        return Ok(());
    }
    for job in &jobs {
        let finished = job
            .completed_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        println!(
            "{:>6}  {:<14} {:<22} started {}  finished {}  processed {} ok {} failed {}{}",
            job.id,
            job.job_type,
            job.status,
            job.started_at.format("%Y-%m-%d %H:%M:%S"),
            finished,
            job.items_processed,
            job.items_succeeded,
            job.items_failed,
            job.error_message
                .as_deref()
                .map(|m| format!("  error: {m}"))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

async fn print_status(store: &impl SyncStore, appid: i32) -> anyhow::Result<()> {
    let Some(status) = store.get_sync_status(appid).await? else {
        anyhow::bail!("app {appid} has no sync state");
    };

    println!("app {appid}: priority {}, syncable {}", status.priority_score, status.is_syncable);
    for source in steamsync_core::SyncSource::ALL {
        let last = status
            .last_synced(source)
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
        println!("  {:<14} {last}", source.as_str());
    }
    if status.consecutive_errors > 0 {
        println!(
            "  {} consecutive errors, last from {}: {}",
            status.consecutive_errors,
            status.last_error_source.as_deref().unwrap_or("?"),
            status.last_error_message.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests;
