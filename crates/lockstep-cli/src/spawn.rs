//! Child process spawn strategies.
//!
//! Shell mode reproduces the historic "hand the whole line to a shell"
//! behavior; argv mode executes the vector directly with no shell
//! interpretation. The two have different escaping and security
//! implications, so they are separate, explicit modes.

use std::process::Stdio;

use tokio::process::{Child, Command};

use lockstep_core::{Error, Result};

/// How the target command line becomes a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnStrategy {
    /// Pass the command line to `sh -c`; the shell does word splitting,
    /// globbing and redirection.
    Shell(String),
    /// Execute the argv directly.
    Argv(Vec<String>),
}

impl SpawnStrategy {
    /// Spawn the child with stdin, stdout and stderr piped.
    ///
    /// The inherited environment is overlaid with one fixed override,
    /// `PMIX_MCA_gds=hash`, a workaround for a PMIx shared-memory issue
    /// when the group transport is Open MPI. The value is opaque here.
    pub fn spawn(&self) -> Result<Child> {
        let mut cmd = match self {
            Self::Shell(line) => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(line);
                cmd
            }
            Self::Argv(argv) => {
                let (program, args) = argv
                    .split_first()
                    .ok_or_else(|| Error::Config("empty command".to_string()))?;
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        };
        cmd
            // https://github.com/open-mpi/ompi/issues/6981
            .env("PMIX_MCA_gds", "hash")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(Error::Spawn)
    }
}
