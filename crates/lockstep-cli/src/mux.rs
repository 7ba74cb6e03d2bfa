//! Output multiplexer.
//!
//! One drain per child output stream. Lines are decorated with the
//! member's rank tag and written to the shared console under a mutex
//! held for exactly one formatted line, so concurrent drains never
//! interleave partial lines. A drain ends when its stream reaches EOF,
//! which the child signals by exiting (or closing the descriptor).

use std::io::ErrorKind;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::debug;

use lockstep_core::{Error, Result, TagPalette};

/// Drain `stream` to the shared console, one decorated line at a time.
///
/// Streams individually preserve their own order; no ordering holds
/// between the stdout and stderr drains of the same member. Invalid
/// UTF-8 is fatal to this drain only.
pub async fn drain<R, W>(
    stream: R,
    rank: u32,
    palette: Arc<TagPalette>,
    console: Arc<Mutex<W>>,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let decorated = palette.decorate(rank, &line);
                let mut console = console.lock().await;
                console.write_all(decorated.as_bytes()).await?;
                console.write_all(b"\n").await?;
                console.flush().await?;
            }
            Ok(None) => break,
            Err(e) if e.kind() == ErrorKind::InvalidData => return Err(Error::Decode(e)),
            Err(e) => return Err(e.into()),
        }
    }
    debug!(rank, "output drain reached end of stream");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn console_lines(console: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
        String::from_utf8(console.lock().await.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn lines_are_decorated_in_stream_order() {
        let palette = Arc::new(TagPalette::default());
        let console = Arc::new(Mutex::new(Vec::new()));

        drain(
            &b"ready\nsteady\n"[..],
            1,
            Arc::clone(&palette),
            Arc::clone(&console),
        )
        .await
        .unwrap();

        assert_eq!(
            console_lines(&console).await,
            vec![palette.decorate(1, "ready"), palette.decorate(1, "steady")]
        );
    }

    #[tokio::test]
    async fn final_line_without_terminator_is_still_printed() {
        let palette = Arc::new(TagPalette::default());
        let console = Arc::new(Mutex::new(Vec::new()));

        drain(&b"partial"[..], 0, Arc::clone(&palette), Arc::clone(&console))
            .await
            .unwrap();

        assert_eq!(
            console_lines(&console).await,
            vec![palette.decorate(0, "partial")]
        );
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_decode_error() {
        let palette = Arc::new(TagPalette::default());
        let console = Arc::new(Mutex::new(Vec::new()));

        let err = drain(&[0xff, 0xfe, b'\n'][..], 0, palette, console)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn concurrent_drains_never_merge_lines() {
        let palette = Arc::new(TagPalette::default());
        let console = Arc::new(Mutex::new(Vec::new()));

        let (out_wr, out_rd) = tokio::io::duplex(16);
        let (err_wr, err_rd) = tokio::io::duplex(16);

        let out_drain = tokio::spawn(drain(
            out_rd,
            0,
            Arc::clone(&palette),
            Arc::clone(&console),
        ));
        let err_drain = tokio::spawn(drain(
            err_rd,
            1,
            Arc::clone(&palette),
            Arc::clone(&console),
        ));

        let writer = |mut half: tokio::io::DuplexStream, word: &'static str| async move {
            for i in 0..20 {
                half.write_all(format!("{word}-{i}\n").as_bytes())
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        };
        tokio::join!(writer(out_wr, "out"), writer(err_wr, "err"));

        out_drain.await.unwrap().unwrap();
        err_drain.await.unwrap().unwrap();

        let lines = console_lines(&console).await;
        assert_eq!(lines.len(), 40);
        // Every console line is exactly one intact decorated line, and
        // each stream's own lines appear in emission order.
        let out_lines: Vec<_> = lines.iter().filter(|l| l.contains("out-")).collect();
        let err_lines: Vec<_> = lines.iter().filter(|l| l.contains("err-")).collect();
        for (i, line) in out_lines.iter().enumerate() {
            assert_eq!(**line, palette.decorate(0, &format!("out-{i}")));
        }
        for (i, line) in err_lines.iter().enumerate() {
            assert_eq!(**line, palette.decorate(1, &format!("err-{i}")));
        }
    }
}
