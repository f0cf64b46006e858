//! Common test infrastructure
//!
//! Every end-to-end test spawns its own [`MockServer`] and points a harness
//! at it. Tests should only import from this module, not from internal
//! submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{MockServer, runner_for, settings};
//! use spinwish_harness::WorkflowCatalog;
//!
//! #[tokio::test]
//! async fn test_signup_login() {
//!     let server = MockServer::spawn().await;
//!     let workflow = WorkflowCatalog::builtin()
//!         .build("signup-login", &settings())
//!         .unwrap();
//!
//!     let run = runner_for(&server).run(&workflow).await.unwrap();
//!     assert!(run.passed());
//! }
//! ```

mod constants;
mod harness;
mod server;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use harness::{client_for, runner_for, settings};
#[allow(unused_imports)]
pub use server::{MockOptions, MockServer};
