//! `lockman`: boundary-scoped action coordination.
//!
//! A library that arbitrates whether a named action may begin executing
//! within a named boundary, and hands back a scoped release token when it
//! is admitted. The core never blocks and never schedules work itself —
//! every decision comes back synchronously as one of three verdicts:
//! admit, admit-after-preempting an existing holder, or refuse with a
//! reason.
//!
//! ```
//! use lockman::facade::{lock, Action};
//! use lockman::info::{ExecutionMode, SingleExecutionInfo};
//!
//! struct Upload;
//!
//! impl Action for Upload {
//!     type Info = SingleExecutionInfo;
//!
//!     fn create_info(&self) -> Self::Info {
//!         SingleExecutionInfo::new("upload", ExecutionMode::Boundary)
//!     }
//! }
//!
//! let result = lock(&Upload, "profile-screen".to_string(), None);
//! if result.is_admit() {
//!     // .. do the work, then either drop `result.token` or call `.release()` ..
//! }
//! ```
//!
//! The crate is organized as: identifiers ([`id`]), per-strategy payloads
//! ([`info`]), the arbitration algorithms themselves ([`strategy`]), the
//! registry that maps a strategy id to a live instance ([`container`]), the
//! release-token lifecycle ([`token`]), the facade entry point ([`facade`]),
//! and the ambient configuration/error/scope plumbing that ties them
//! together ([`config`], [`error`], [`scope`]).

pub mod config;
pub mod container;
pub mod error;
pub mod facade;
pub mod id;
pub mod info;
pub mod scope;
mod state;
pub mod strategy;
pub mod token;
pub mod verdict;

pub use error::{PrecedingCancellationError, RegistrationError, StrategyError, StrategyErrorKind};
pub use facade::{lock, Action, LockResult};
pub use id::{ActionId, BoundaryId, GroupId, StrategyId, UniqueId};
pub use token::{Executor, ReleaseOption, UnlockToken};
pub use verdict::Verdict;
