//! snowshare core - idempotent two-phase provisioning orchestrator
//!
//! Runs a fixed, strictly ordered pipeline against two administrative
//! sessions: the provider phase creates secure views, a share and a managed
//! reader account; the reader phase builds the warehouse, the shared
//! database and the end-user login inside that account. Every step is
//! independently idempotent because it re-derives state from the remote
//! system rather than keeping local bookkeeping.

pub mod notify;
pub mod pipeline;
pub mod provider;
pub mod reader;
pub mod reconcile;
pub mod statements;

pub use notify::{notify_if_new_user, CredentialsMail, Mailer};
pub use pipeline::{run_pipeline, PipelineReport};
pub use provider::ProviderOutcome;
pub use reader::ReaderOutcome;
