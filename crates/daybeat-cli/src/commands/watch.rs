//! Live trigger loop.
//!
//! Spawns the runtime service, prints feed entries as they appear and
//! surfaces decision prompts on stdout, reading y/n answers from stdin.
//! The snapshot is written back on exit.

use clap::Args;
use daybeat_core::{runtime, Config, DecisionAnswer, DecisionRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::state;

#[derive(Args)]
pub struct WatchArgs {
    /// Tick interval override in seconds
    #[arg(long)]
    tick_secs: Option<u64>,
}

pub async fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default();
    if let Some(tick) = args.tick_secs {
        config.engine.tick_secs = tick;
    }
    let store = state::load_store()?;
    let (handle, join) = runtime::spawn(&config, store);
    info!(tick_secs = config.engine.tick_secs, "watch loop started");

    println!("Watching the schedule. Answer prompts with y/n; q or Ctrl+C to exit.");

    let mut poll = tokio::time::interval(config.engine.tick_interval());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_seen = 0u64;
    let mut current: Option<DecisionRequest> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                for entry in handle.notifications_since(last_seen).await? {
                    last_seen = entry.id;
                    println!("{entry}");
                }
                if current.is_none() {
                    if let Some(request) = handle.pending_decision().await? {
                        println!("{} [y/n]", request.prompt);
                        current = Some(request);
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                let input = line.trim().to_ascii_lowercase();
                if current.is_none() && (input == "q" || input == "quit") {
                    break;
                }
                let answer = match input.as_str() {
                    "y" | "yes" => DecisionAnswer::Confirm,
                    "n" | "no" => DecisionAnswer::Decline,
                    _ => {
                        if let Some(ref request) = current {
                            println!("{} [y/n]", request.prompt);
                        }
                        continue;
                    }
                };
                if let Some(request) = current.take() {
                    match handle.resolve(request.id, answer).await {
                        Ok(Some(next)) => {
                            println!("{} [y/n]", next.prompt);
                            current = Some(next);
                        }
                        Ok(None) => {}
                        Err(e) => eprintln!("error: {e}"),
                    }
                }
            }
        }
    }

    let snapshot = handle.shutdown().await?;
    state::save_snapshot(&snapshot)?;
    join.await?;
    println!("Schedule saved.");
    Ok(())
}
