//! Harvest Server - HTTP intake for harvest stem-count submissions
//!
//! Field workers scan a QR code, fill in the variety, size and stem count of
//! a bundle, and post the form here. Every submission goes through the
//! [`harvest::IntakeOrchestrator`]: normalize, check for a duplicate, then
//! append to each configured store.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe, lists stores and the duplicate policy
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/v1/form-options?block=1&type=national` - Varieties and sizes
//!
//! ## Submissions (IP allow-list)
//!
//! - `POST /submit` - URL-encoded form
//! - `POST /api/v1/submissions` - JSON body
//!
//! A duplicate answers `409` with the candidate record and the form fields to
//! resubmit with `force=true`.

pub mod access;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use access::IpAllowList;
pub use config::ServerConfig;
pub use error::{ResubmitForm, ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
