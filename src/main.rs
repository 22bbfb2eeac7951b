use clap::Parser;
use collar::config::{self, ExecutorKind};
use collar::display::ConsoleDisplay;
use collar::models::player::Player;
use collar::models::types::Dimension;
use collar::{Registry, Source};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::runtime::Handle;

// cargo run --bin collar-console -- --player Steve --server

#[derive(Debug, Parser)]
#[command(name = "collar-console", version, about = "Drive the collar command core from a terminal")]
struct Args {
    /// TOML config file (if omitted, use env)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Register commands without the leading `collar` literal
    #[arg(long)]
    unprefixed: bool,

    /// Where GLOBAL event handlers run (inline, tokio, tick)
    #[arg(long)]
    executor: Option<ExecutorKind>,

    /// Local player name
    #[arg(long)]
    player: Option<String>,

    /// Pretend a multiplayer world loaded at start-up, which connects collar
    #[arg(long)]
    server: bool,

    /// Print the command tree as JSON and exit
    #[arg(long)]
    dump_tree: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::from_env()?,
    };
    if args.unprefixed {
        cfg.prefixed = false;
    }
    if let Some(kind) = args.executor {
        cfg.executor = kind;
    }
    if let Some(name) = args.player {
        cfg.player_name = name;
    }
    let cfg = Arc::new(cfg);
    init_tracing(&cfg.log_filter);

    let display = Arc::new(ConsoleDisplay::stdout());
    let registry = Arc::new(Registry::new(cfg.clone(), display, Some(Handle::current()))?);

    if args.dump_tree {
        let snapshot = registry.dispatcher.snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    registry.world.enter(
        Player::new(cfg.player_name.clone()),
        0.0,
        64.0,
        0.0,
        Dimension::Overworld,
    );
    registry.host.world_loaded(args.server);

    repl(registry, cfg.tick_millis).await
}

async fn repl(registry: Arc<Registry>, tick_millis: u64) -> anyhow::Result<()> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(tick_millis.max(1)));

    tracing::info!("collar console ready, type :help");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                registry.host.tick();
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(builtin) = line.strip_prefix(':') {
                    if !console_builtin(&registry, builtin) {
                        break;
                    }
                    continue;
                }
                registry.execute(Source::Console, line.trim_start_matches('/'));
            }
        }
    }

    registry.host.disconnected();
    tracing::info!("collar console closed");
    Ok(())
}

/// Console-only helpers that stand in for the game client. Returns `false` to quit.
fn console_builtin(registry: &Registry, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.collect::<Vec<_>>().as_slice()) {
        (Some("quit" | "exit"), _) => return false,
        (Some("help"), _) => {
            for u in registry.dispatcher.usage() {
                println!("  {u}");
            }
            println!("  :join <player> | :part <player> | :tp <x> <y> <z> [dimension] | :frame | :quit");
        }
        (Some("join"), [name]) => registry.world.add_player(Player::new(*name)),
        (Some("part"), [name]) => registry.world.remove_player(name),
        (Some("tp"), [x, y, z, rest @ ..]) => {
            let dim = rest.first().and_then(|d| Dimension::parse(d)).unwrap_or(Dimension::Overworld);
            match (x.parse(), y.parse(), z.parse()) {
                (Ok(x), Ok(y), Ok(z)) => registry.world.move_to(x, y, z, dim),
                _ => eprintln!("usage: :tp <x> <y> <z> [dimension]"),
            }
        }
        (Some("frame"), _) => registry.host.render_frame(0.0),
        _ => eprintln!("unknown console command, try :help"),
    }
    true
}

fn init_tracing(filter: &str) {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().unwrap();

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();
}
