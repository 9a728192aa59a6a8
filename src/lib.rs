//! Start/stop: self-service task assignment for GitHub issues.
//!
//! Contributors claim an issue with `/start` (optionally with teammates) and
//! release it with `/stop`. Opening a pull request that closes an issue
//! assigns its author automatically.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the issue tracker and wallet store
//! - **Adapters**: GitHub, wallet database and in-memory implementations
//!
//! # Modules
//!
//! - [`assignment`]: Assignment rules, ports, adapters and services
//! - [`config`]: Plugin settings and environment validation
//! - [`plugin`]: Invocation decoding and event dispatch
//! - [`server`]: HTTP entry point

pub mod assignment;
pub mod config;
pub mod plugin;
pub mod server;
