//! Distributed batch determinant computation over role-exchange.
//!
//! `determinant` computes the determinant of every matrix in a batch. The
//! batch is split across a coordinator and its workers, each role works its
//! block, and the coordinator reports all results in index order.
//!
//! # Roles
//!
//! - **Coordinator** (rank 0): loads the batch from a [`MatrixSource`],
//!   partitions it, sends every worker its block, computes its own block,
//!   then gathers the replies after a barrier.
//! - **Worker** (ranks `1..roles`): receives one block, computes it and
//!   sends the determinants back.
//!
//! # Example
//!
//! ```no_run
//! use determinant::{BatchFile, Engine, run_local};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = run_local(&BatchFile::new("coefData.bin"), 4, Engine::Cofactor).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod config;
mod coordinator;
mod engine;
mod error;
mod hub;
mod local;
mod matrix;
mod partition;
mod report;
mod source;
pub mod wire;
mod worker;

pub use coordinator::Coordinator;
pub use engine::{Engine, cofactor_determinant, elimination_determinant};
pub use error::Error;
pub use hub::run_hub;
pub use local::run_local;
pub use matrix::{Batch, Matrix};
pub use partition::{Assignment, partition};
pub use report::{DeterminantResult, Report, ResultSet};
pub use source::{BatchFile, MatrixSource, random_batch};
pub use worker::Worker;
