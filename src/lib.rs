//! previewd - build-and-preview service for uploaded web projects
//!
//! This library implements a single-tenant build-as-a-service endpoint:
//! a caller POSTs a base64-encoded project archive, previewd stages it in an
//! isolated temporary directory, runs the external build toolchain against
//! it, and publishes the resulting static artifact tree under a public root
//! where it is served at a stable preview URL.
//!
//! # Core Concepts
//!
//! - **Staging**: every build gets its own ephemeral working directory under
//!   the temporary root. It is removed on every exit path, success or
//!   failure.
//! - **Toolchain**: the build tool is an external command (by default the
//!   Flutter SDK) consumed as an opaque collaborator. previewd never trusts
//!   its exit code alone; the artifact tree must exist on disk for a build
//!   to count as successful.
//! - **Publication**: the artifact tree is copied under
//!   `<public_root>/preview/<project_id>`, overwriting whatever a previous
//!   build published for the same identifier.
//!
//! # Project Structure
//!
//! - [`sanitize`]: project identifier normalization
//! - [`staging`]: staging directory lifecycle
//! - [`archive`]: payload decoding and zip expansion
//! - [`toolchain`]: external command invocation with bounded output capture
//! - [`publish`]: artifact tree publication
//! - [`pipeline`]: the end-to-end build orchestration
//! - [`server`] and [`routes`]: the HTTP surface

pub mod archive;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod routes;
pub mod sanitize;
pub mod server;
pub mod staging;
pub mod toolchain;

// Re-export key types for convenient access
pub use config::Config;
pub use error::BuildError;
pub use pipeline::{BuildOutcome, BuildPipeline};
pub use server::AppState;

/// Crate version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
