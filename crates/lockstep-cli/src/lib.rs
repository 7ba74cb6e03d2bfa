//! Lockstep CLI library.
//!
//! Wires the core group channel to real child processes: spawn
//! strategies, the input relay, the output multiplexer and the
//! per-member process supervisor.

pub mod mux;
pub mod relay;
pub mod spawn;
pub mod supervisor;
