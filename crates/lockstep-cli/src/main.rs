//! Lockstep CLI
//!
//! Runs one instance of a command per member of a fixed-size process
//! group, fans the console input out to every member in lockstep, and
//! multiplexes the children's stdout/stderr back onto one console with
//! per-rank colored tags.
//!
//! All members are hosted in this process over the in-process group
//! transport; the rank-0 member reads the real stdin.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use lockstep_cli::spawn::SpawnStrategy;
use lockstep_cli::supervisor::{self, ConsoleInput};
use lockstep_core::group::{GroupChannel, ROOT_RANK};
use lockstep_core::tracing_init::init_tracing;
use lockstep_core::{LocalGroup, TagPalette, config};

#[derive(Parser, Debug)]
#[command(name = "lockstep")]
#[command(version, about = "Run a command per group member with lockstep console input", long_about = None)]
struct Cli {
    /// Command line to hand to `sh -c` (shell mode)
    #[arg(short = 'c', long, conflicts_with = "command")]
    shell: Option<String>,

    /// Command and arguments to execute directly (argv mode)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,

    /// Number of group members to host in this process
    #[arg(short = 'n', long, default_value_t = 1, env = "LOCKSTEP_MEMBERS")]
    members: u32,

    /// Bound on any collective wait, in seconds (0 = wait forever)
    #[arg(long, env = "LOCKSTEP_BROADCAST_TIMEOUT")]
    broadcast_timeout: Option<u64>,

    /// Emit structured JSON log lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("lockstep=info", cli.log_json);

    let strategy = if let Some(line) = cli.shell {
        SpawnStrategy::Shell(line)
    } else if cli.command.is_empty() {
        anyhow::bail!("no command given; pass an argv or use --shell");
    } else {
        SpawnStrategy::Argv(cli.command.clone())
    };

    let project_dir = std::env::current_dir().ok();
    let mut cfg =
        config::load_config(project_dir.as_deref()).context("loading configuration")?;
    if let Some(secs) = cli.broadcast_timeout {
        cfg.group.broadcast_timeout_secs = secs;
    }

    let palette = Arc::new(TagPalette::from_names(&cfg.display.palette)?);
    // Fail before any child is spawned when the group cannot be labeled.
    palette.validate(cli.members)?;

    info!(
        members = cli.members,
        strategy = ?strategy,
        "starting process group"
    );

    let members = LocalGroup::create(cli.members, cfg.group.broadcast_timeout())?;
    let console = Arc::new(tokio::sync::Mutex::new(tokio::io::stdout()));

    let mut runs = Vec::with_capacity(members.len());
    for member in members {
        let rank = member.rank();
        let input: ConsoleInput = if rank == ROOT_RANK {
            Box::new(tokio::io::stdin())
        } else {
            Box::new(tokio::io::empty())
        };
        let strategy = strategy.clone();
        let group = Arc::new(member);
        let palette = Arc::clone(&palette);
        let console = Arc::clone(&console);
        runs.push((
            rank,
            tokio::spawn(async move {
                supervisor::run(&strategy, group, palette, input, console).await
            }),
        ));
    }

    // The overall exit status is the root member's child status; when
    // the root succeeded, the first non-zero status of any other member
    // is reported instead.
    let mut root_code = 0;
    let mut other_code = 0;
    for (rank, run) in runs {
        let code = match run.await {
            Ok(Ok(status)) => status.code().unwrap_or(1),
            Ok(Err(e)) => {
                error!(rank, error = %e, "group member failed");
                return Err(e.into());
            }
            Err(e) => {
                error!(rank, error = %e, "group member task panicked");
                1
            }
        };
        if rank == ROOT_RANK {
            root_code = code;
        } else if other_code == 0 {
            other_code = code;
        }
    }

    let exit = if root_code == 0 { other_code } else { root_code };
    if exit != 0 {
        std::process::exit(exit);
    }
    Ok(())
}
