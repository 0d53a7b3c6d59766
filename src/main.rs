use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use btc_confirm_watch::config::Settings;
use btc_confirm_watch::engine::{ChatId, SessionEvent, UserId};
use btc_confirm_watch::explorer::HttpExplorer;
use btc_confirm_watch::notify::StdoutNotifier;
use btc_confirm_watch::runtime::{parse_command, Dispatcher};
use btc_confirm_watch::store::JsonFileStore;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "config/settings.json")]
    config: String,

    /// Override the explorer base URL from the settings file.
    #[arg(long)]
    explorer_url: Option<String>,

    /// Override the poll interval (seconds) from the settings file.
    #[arg(long)]
    poll_secs: Option<u64>,

    /// User identity for this console session.
    #[arg(long, default_value_t = 1)]
    user_id: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = Settings::load_or_default(&args.config)?;
    if let Some(url) = args.explorer_url {
        settings.explorer_url = url;
    }
    if let Some(secs) = args.poll_secs {
        settings.poll_interval_secs = secs;
    }
    log::info!("[MAIN] {}", settings);

    let explorer = Arc::new(HttpExplorer::new(settings.explorer_url.clone()));
    let store = JsonFileStore::load(&settings.storage_path)?;
    let dispatcher = Dispatcher::new(
        explorer,
        StdoutNotifier,
        store,
        settings.default_confirmations,
        settings.tick(),
    );
    let events = dispatcher.sender();
    tokio::spawn(dispatcher.run());

    let user = UserId(args.user_id);
    let chat = ChatId(args.user_id as i64);

    println!("BTC confirmation watch (console transport)");
    println!("Commands: /start /wallet /setwallet /confirmations /track /stop /cancel /quit");
    println!("Anything else is treated as input for the active prompt.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if line.trim() == "/quit" {
            break;
        }
        let command = parse_command(&line);
        if events
            .send(SessionEvent::Command {
                user,
                chat,
                command,
            })
            .is_err()
        {
            break;
        }
    }

    Ok(())
}
