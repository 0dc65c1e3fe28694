//! # bumbo-sync
//!
//! Retrieve / merge / deploy reconciliation between a local project and a
//! remote org.
//!
//! Build a [`Session`] and call [`Session::retrieve`] or [`Session::deploy`].
//! The remote side is reached only through the [`Org`] trait and merges only
//! through the [`MergeTool`] trait.

pub mod deploy;
pub mod error;
pub mod inventory;
pub mod merge;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod staging;
pub mod timestamp_store;

pub use error::SyncError;
pub use merge::{FileOutcome, KDiff3, MergeTool};
pub use reconcile::{ComponentReport, ComponentState};
pub use remote::{Org, RemoteError, RemoteFileProperties, SfdxCli};
pub use session::{Flow, Session, SessionReport};
pub use timestamp_store::{RetrieveStamp, TimestampRecord};
