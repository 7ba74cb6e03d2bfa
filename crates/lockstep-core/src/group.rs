//! Collective group-channel abstraction.
//!
//! The transport that actually moves frames between members (in-process
//! channels, MPI, anything else) lives behind the [`GroupChannel`] trait.
//! The relay and supervisor only ever see this seam.

use async_trait::async_trait;

use crate::error::Result;

/// Rank of the member that originates console input broadcasts.
pub const ROOT_RANK: u32 = 0;

/// The unit of transfer on the group channel.
///
/// Input lines are replicated verbatim, trailing newline included, so
/// every member writes byte-identical data to its child's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One console line, terminator included.
    Line(String),
    /// The root's console reached end-of-stream; no further lines will
    /// be broadcast. Followers use this to leave their receive loop
    /// instead of blocking forever.
    EndOfInput,
}

/// Handle onto a fixed-size process group with a collective broadcast.
///
/// `rank` and `size` are constant for the life of the process. `broadcast`
/// is a collective: every member must call it the same number of times and
/// in the same relative order. The member whose rank equals `root` supplies
/// `Some(frame)` and has it echoed back; every other member passes `None`
/// and receives the root's frame. Frames issued by the root in order
/// i = 1, 2, ... are observed by every member in that same order.
#[async_trait]
pub trait GroupChannel: Send + Sync {
    /// This member's rank, unique within the group.
    fn rank(&self) -> u32;

    /// Total number of members in the group.
    fn size(&self) -> u32;

    /// Perform one collective broadcast rooted at `root`.
    ///
    /// Implementations bound the wait: a peer that stops participating
    /// surfaces as [`crate::Error::BroadcastTimeout`] or
    /// [`crate::Error::GroupClosed`] rather than an indefinite hang.
    async fn broadcast(&self, frame: Option<Frame>, root: u32) -> Result<Frame>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn frame_clone_is_deep_equal() {
        let frame = Frame::Line("ping\n".to_string());
        assert_eq!(frame.clone(), frame);
        assert_ne!(frame, Frame::EndOfInput);
    }
}
