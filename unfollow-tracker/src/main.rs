/*!
Instagram Unfollow Tracker
*/

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Arg, ArgAction, Command, crate_version, value_parser};
use instagram_api::InstagramClient;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use unfollow_tracker::core::{
    auth::{self, Authenticator},
    config::{TerminalFormat, TrackerConfig},
    diff_engine::DiffEngine,
    output::TerminalReporter,
    prompt::TerminalPrompter,
    session_store::SessionStore,
    snapshot_store::SnapshotStore,
    tracker::UnfollowTracker,
};

fn cli() -> Command {
    Command::new("Instagram Unfollow Tracker")
        .version(crate_version!())
        .about("Checks your followers on a timer and reports who unfollowed you")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML config file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .help("Account to track (defaults to INSTAGRAM_USER or a prompt)")
                .value_name("USERNAME"),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .help("Directory for the follower snapshot and session file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .help("Seconds between checks")
                .value_name("SECS")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("plain")
                .long("plain")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single check and exit")
                .action(ArgAction::SetTrue),
        )
}

async fn run(matches: clap::ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = TrackerConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    if let Some(username) = matches.get_one::<String>("username") {
        config.account.username = Some(username.clone());
    }
    if let Some(data_dir) = matches.get_one::<PathBuf>("data-dir") {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(interval) = matches.get_one::<u64>("interval") {
        config.polling.interval_secs = *interval;
    }
    if matches.get_flag("plain") {
        config.output.format = TerminalFormat::Plain;
    }
    let max_cycles = matches.get_flag("once").then_some(1);

    let prompter = Arc::new(TerminalPrompter);
    let username = auth::resolve_username(config.account.username.clone(), &*prompter)?;

    let authenticator = Authenticator::new(
        username.clone(),
        auth::password_from_env(),
        SessionStore::new(config.session_path(&username)),
        prompter,
    );
    let engine = DiffEngine::new(username, SnapshotStore::new(config.snapshot_path()));
    let client = InstagramClient::new(config.client_config())?;
    let reporter = TerminalReporter::stdout(config.output.format);

    let mut tracker = UnfollowTracker::new(client, authenticator, engine, reporter, config.interval());
    tracker.authenticate().await?;
    println!("\n✅ Session is active. Checking for unfollowers...");

    let shutdown = CancellationToken::new();
    let watcher = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Shutdown");
            watcher.cancel();
        }
    });

    tracker.run(shutdown, max_cycles).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(cli().get_matches()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}
