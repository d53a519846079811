use anyhow::Context;
use clap::{Parser, ValueEnum};
use tickerscan_core::domain::Category;
use tickerscan_core::narrative::NarrativeClient;
use tickerscan_core::time::market;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod runner;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    All,
    Day,
    Swing,
    Long,
}

impl CategoryArg {
    fn categories(self) -> Vec<Category> {
        match self {
            CategoryArg::All => Category::ALL.to_vec(),
            CategoryArg::Day => vec![Category::DayTrade],
            CategoryArg::Swing => vec![Category::Swing],
            CategoryArg::Long => vec![Category::LongTerm],
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tickerscan_worker")]
struct Args {
    /// Categories to scan this run.
    #[arg(long, value_enum, default_value = "all")]
    category: CategoryArg,

    /// Scan date (YYYY-MM-DD). Defaults to today's US Eastern date.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Shrink each candidate pool to a handful of tickers.
    #[arg(long)]
    test_mode: bool,

    /// Run even on weekends and market holidays.
    #[arg(long)]
    force: bool,

    /// Do everything except persisting and notifying.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tickerscan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let as_of_date = market::resolve_as_of_date(args.as_of_date.as_deref(), chrono::Utc::now())?;

    // Gate before any connection or fetch: a closed market is a clean no-op.
    if let market::GateDecision::Closed { reason } = market::gate(as_of_date, args.force) {
        tracing::info!(%as_of_date, reason, "market closed; run skipped");
        return Ok(());
    }

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    tickerscan_core::storage::migrate(&pool).await?;

    let facts = tickerscan_core::providers::HttpFactProvider::from_settings(&settings)?;
    let pacer = tickerscan_core::ratelimit::Pacer::from_env();
    let notifier = tickerscan_core::notify::PushNotifier::from_settings(&settings)?;

    // Narrative generation is optional; without a key every rationale uses
    // the template fallback.
    let narrative: Option<Box<dyn NarrativeClient>> = if settings.anthropic_api_key.is_some() {
        Some(Box::new(
            tickerscan_core::narrative::anthropic::AnthropicClient::from_settings(&settings)?,
        ))
    } else {
        tracing::warn!("ANTHROPIC_API_KEY not set; rationales will use the template fallback");
        None
    };

    let opts = runner::RunOptions {
        categories: args.category.categories(),
        as_of_date,
        test_mode: args.test_mode,
        dry_run: args.dry_run,
    };

    let runner = runner::Runner {
        pool: &pool,
        quotes: &facts,
        signals: &facts,
        screen: &facts,
        pacer: &pacer,
        narrative: narrative.as_deref(),
        notifier: &notifier,
        opts,
    };
    let summary = runner.run().await;

    for result in &summary.completed {
        tracing::info!(
            category = %result.category,
            persisted = result.persisted,
            %as_of_date,
            "category scan complete"
        );
    }

    if !summary.failures.is_empty() {
        for (category, error) in &summary.failures {
            let err = anyhow::anyhow!("category {category} failed: {error}");
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%category, error, "category scan failed");
        }
        anyhow::bail!("{} category scan(s) failed", summary.failures.len());
    }

    Ok(())
}

fn init_sentry(settings: &tickerscan_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
