//! Input relay.
//!
//! The root member reads the console and replicates every line to the
//! whole group before feeding its own child; followers receive the
//! broadcast lines and feed their children. Every child therefore sees
//! the exact console line sequence, in order, with no loss or
//! duplication.
//!
//! When the root's console reaches end-of-stream it broadcasts one
//! [`Frame::EndOfInput`] so followers leave their receive loop instead
//! of blocking on a broadcast that will never come. The relay drops the
//! child stdin handle on return, which closes the pipe and lets the
//! child observe EOF.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use lockstep_core::Result;
use lockstep_core::group::{Frame, GroupChannel, ROOT_RANK};

/// Run the relay in the role fixed by this member's rank.
pub async fn run<C, R, W>(group: Arc<C>, console: R, child_stdin: W) -> Result<()>
where
    C: GroupChannel + ?Sized,
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    if group.rank() == ROOT_RANK {
        run_root(group, console, child_stdin).await
    } else {
        run_follower(group, child_stdin).await
    }
}

async fn run_root<C, R, W>(group: Arc<C>, console: R, mut child_stdin: W) -> Result<()>
where
    C: GroupChannel + ?Sized,
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut lines = BufReader::new(console).lines();
    while let Some(line) = lines.next_line().await? {
        let line = format!("{line}\n");
        group
            .broadcast(Some(Frame::Line(line.clone())), ROOT_RANK)
            .await?;
        child_stdin.write_all(line.as_bytes()).await?;
        child_stdin.flush().await?;
    }
    group.broadcast(Some(Frame::EndOfInput), ROOT_RANK).await?;
    debug!("console input closed, end-of-input broadcast");
    Ok(())
}

async fn run_follower<C, W>(group: Arc<C>, mut child_stdin: W) -> Result<()>
where
    C: GroupChannel + ?Sized,
    W: AsyncWrite + Unpin + Send,
{
    loop {
        match group.broadcast(None, ROOT_RANK).await? {
            Frame::Line(line) => {
                child_stdin.write_all(line.as_bytes()).await?;
                child_stdin.flush().await?;
            }
            Frame::EndOfInput => {
                debug!(rank = group.rank(), "end of input received");
                return Ok(());
            }
        }
    }
}
