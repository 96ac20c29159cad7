//! Command-line configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::Engine;

pub const DEFAULT_FILE: &str = "coefData.bin";
pub const DEFAULT_ADDR: &str = "127.0.0.1:50051";

#[derive(Debug, Parser)]
#[command(
    name = "determinant",
    version,
    about = "Computes the determinants of a batch of square matrices across cooperating roles"
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every role inside this process.
    Run {
        #[command(flatten)]
        batch: BatchArgs,
        #[command(flatten)]
        roles: RoleArgs,
    },
    /// Run role 0 and wait for the workers to connect.
    Coordinator {
        #[command(flatten)]
        batch: BatchArgs,
        #[command(flatten)]
        roles: RoleArgs,
        /// Address to listen on for workers.
        #[arg(long, env = "DETERMINANT_ADDR", default_value = DEFAULT_ADDR)]
        listen: String,
    },
    /// Run one worker role against a remote coordinator.
    Worker {
        /// Coordinator address.
        #[arg(long, env = "DETERMINANT_ADDR", default_value = DEFAULT_ADDR)]
        connect: String,
        /// This worker's rank, in 1..roles.
        #[arg(long)]
        rank: usize,
        /// Total number of roles, the coordinator included.
        #[arg(long)]
        roles: usize,
    },
    /// Write a batch file of random matrices.
    Generate {
        #[command(flatten)]
        batch: BatchArgs,
        /// Number of matrices.
        #[arg(long)]
        count: usize,
        /// Order shared by every matrix.
        #[arg(long)]
        order: usize,
        /// Seed for reproducible batches.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// Batch file.
    #[arg(short, long, env = "DETERMINANT_FILE", default_value = DEFAULT_FILE)]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct RoleArgs {
    /// Total number of roles, the coordinator included.
    #[arg(short, long, default_value_t = 1)]
    pub roles: usize,
    /// Determinant algorithm.
    #[arg(long, value_enum, default_value_t = Engine::Cofactor)]
    pub engine: Engine,
}
