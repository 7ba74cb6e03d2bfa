//! Per-member process supervisor.
//!
//! Owns the child process handle: validates the group against the tag
//! palette, spawns the child, starts the input relay and the two output
//! drains as tracked tasks, waits for the child, then performs an
//! ordered shutdown so output buffered at exit still reaches the
//! console.

use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use lockstep_core::group::GroupChannel;
use lockstep_core::{Error, Result, TagPalette};

use crate::spawn::SpawnStrategy;
use crate::{mux, relay};

/// Console input for one member: the real stdin on the root member, an
/// empty reader everywhere else.
pub type ConsoleInput = Box<dyn AsyncRead + Send + Unpin>;

/// Run one group member to completion and return its child's exit
/// status.
///
/// Fails fast, before anything is spawned, when the group is larger
/// than the palette can label. Spawn failure is likewise fatal with no
/// task started and nothing leaked.
pub async fn run<C, W>(
    strategy: &SpawnStrategy,
    group: Arc<C>,
    palette: Arc<TagPalette>,
    input: ConsoleInput,
    console: Arc<Mutex<W>>,
) -> Result<ExitStatus>
where
    C: GroupChannel + ?Sized + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    palette.validate(group.size())?;

    let rank = group.rank();
    let mut child = strategy.spawn()?;
    info!(rank, pid = ?child.id(), "child process spawned");

    let child_stdin = child
        .stdin
        .take()
        .ok_or(Error::Protocol("child stdin was not piped"))?;
    let child_stdout = child
        .stdout
        .take()
        .ok_or(Error::Protocol("child stdout was not piped"))?;
    let child_stderr = child
        .stderr
        .take()
        .ok_or(Error::Protocol("child stderr was not piped"))?;

    let relay: JoinHandle<Result<()>> =
        tokio::spawn(relay::run(Arc::clone(&group), input, child_stdin));
    let stdout_drain = tokio::spawn(mux::drain(
        child_stdout,
        rank,
        Arc::clone(&palette),
        Arc::clone(&console),
    ));
    let stderr_drain = tokio::spawn(mux::drain(child_stderr, rank, palette, console));

    let status = child.wait().await?;
    info!(rank, code = ?status.code(), "child process exited");

    // Ordered shutdown: the drains run until their stream's EOF, so
    // output buffered at child exit still reaches the console.
    for (stream, drain) in [("stdout", stdout_drain), ("stderr", stderr_drain)] {
        match drain.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(rank, stream, error = %e, "output drain failed"),
            Err(e) => warn!(rank, stream, error = %e, "output drain panicked"),
        }
    }

    // The relay may still be parked in a console read or a collective
    // call that can no longer complete now that the child is gone.
    if relay.is_finished() {
        if let Ok(Err(e)) = relay.await {
            warn!(rank, error = %e, "input relay failed");
        }
    } else {
        relay.abort();
        let _ = relay.await;
    }

    Ok(status)
}
