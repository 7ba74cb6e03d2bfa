//! In-process group transport.
//!
//! Hosts all members of a group inside one OS process: every member gets
//! a [`LocalGroup`] handle, and the root's broadcasts are fanned out over
//! bounded per-member queues. Delivery queues have capacity 1, so the
//! root experiences back-pressure from a member that has stopped calling
//! `broadcast` - the collective rendezvous of the contract.
//!
//! FIFO delivery per queue provides the ordering guarantee: frames sent
//! by the root in order are received by every member in that order.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::group::{Frame, GroupChannel};

/// One member's handle onto an in-process group.
pub struct LocalGroup {
    rank: u32,
    size: u32,
    bound: Option<Duration>,
    /// Delivery queue senders, indexed by rank. The entry for this
    /// member's own rank is never used.
    peers: Vec<mpsc::Sender<Frame>>,
    inbox: Mutex<mpsc::Receiver<Frame>>,
}

impl LocalGroup {
    /// Create a group of `size` members, returning one handle per rank.
    ///
    /// `bound` limits how long any single collective wait may block;
    /// `None` waits indefinitely (the original blocking-collective
    /// behavior).
    pub fn create(size: u32, bound: Option<Duration>) -> Result<Vec<Self>> {
        if size == 0 {
            return Err(Error::Protocol("group size must be at least 1"));
        }

        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::channel::<Frame>(1)).unzip();

        let members = (0..size)
            .zip(receivers)
            .map(|(rank, inbox)| Self {
                rank,
                size,
                bound,
                peers: senders.clone(),
                inbox: Mutex::new(inbox),
            })
            .collect();
        debug!(size, bound = ?bound, "created in-process group");
        Ok(members)
    }

    /// Run `fut` under the configured collective wait bound.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.bound {
            Some(bound) => tokio::time::timeout(bound, fut)
                .await
                .map_err(|_| Error::BroadcastTimeout(bound))?,
            None => fut.await,
        }
    }
}

#[async_trait]
impl GroupChannel for LocalGroup {
    fn rank(&self) -> u32 {
        self.rank
    }

    fn size(&self) -> u32 {
        self.size
    }

    async fn broadcast(&self, frame: Option<Frame>, root: u32) -> Result<Frame> {
        if root >= self.size {
            return Err(Error::Protocol("root rank out of range"));
        }

        if self.rank == root {
            let frame = frame.ok_or(Error::Protocol("root member must supply a frame"))?;
            for (rank, peer) in (0..self.size).zip(&self.peers) {
                if rank == self.rank {
                    continue;
                }
                let outgoing = frame.clone();
                self.bounded(async { peer.send(outgoing).await.map_err(|_| Error::GroupClosed) })
                    .await?;
            }
            Ok(frame)
        } else {
            if frame.is_some() {
                return Err(Error::Protocol("only the root member may supply a frame"));
            }
            let mut inbox = self.inbox.lock().await;
            self.bounded(async { inbox.recv().await.ok_or(Error::GroupClosed) })
                .await
        }
    }
}

impl std::fmt::Debug for LocalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalGroup")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::group::ROOT_RANK;

    #[tokio::test]
    async fn create_assigns_dense_ranks() {
        let members = LocalGroup::create(3, None).unwrap();
        let ranks: Vec<u32> = members.iter().map(GroupChannel::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(members.iter().all(|m| m.size() == 3));
    }

    #[tokio::test]
    async fn create_rejects_empty_group() {
        assert!(matches!(
            LocalGroup::create(0, None),
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn broadcast_preserves_root_order() {
        let mut members = LocalGroup::create(2, None).unwrap();
        let follower = members.remove(1);
        let root = members.remove(0);

        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..3 {
                seen.push(follower.broadcast(None, ROOT_RANK).await.unwrap());
            }
            seen
        });

        for text in ["one\n", "two\n", "three\n"] {
            let echoed = root
                .broadcast(Some(Frame::Line(text.to_string())), ROOT_RANK)
                .await
                .unwrap();
            assert_eq!(echoed, Frame::Line(text.to_string()));
        }

        let seen = collector.await.unwrap();
        assert_eq!(
            seen,
            vec![
                Frame::Line("one\n".to_string()),
                Frame::Line("two\n".to_string()),
                Frame::Line("three\n".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn non_root_must_not_supply_a_frame() {
        let mut members = LocalGroup::create(2, None).unwrap();
        let follower = members.remove(1);
        let err = follower
            .broadcast(Some(Frame::EndOfInput), ROOT_RANK)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn silent_root_surfaces_as_timeout() {
        let mut members = LocalGroup::create(2, Some(Duration::from_millis(50))).unwrap();
        let follower = members.remove(1);
        let err = follower.broadcast(None, ROOT_RANK).await.unwrap_err();
        assert!(matches!(err, Error::BroadcastTimeout(_)));
    }

    #[tokio::test]
    async fn departed_member_surfaces_as_closed() {
        let mut members = LocalGroup::create(2, None).unwrap();
        drop(members.remove(1));
        let root = members.remove(0);
        let err = root
            .broadcast(Some(Frame::Line("lost\n".to_string())), ROOT_RANK)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GroupClosed));
    }

    #[tokio::test]
    async fn single_member_group_echoes_immediately() {
        let mut members = LocalGroup::create(1, Some(Duration::from_millis(50))).unwrap();
        let root = members.remove(0);
        let echoed = root
            .broadcast(Some(Frame::EndOfInput), ROOT_RANK)
            .await
            .unwrap();
        assert_eq!(echoed, Frame::EndOfInput);
    }
}
