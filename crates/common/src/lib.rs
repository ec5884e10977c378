//! Shared configuration, error handling, and transport contracts for Planpal
//!
//! This crate provides common functionality used across the Planpal service:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - The failure sink that receives every captured error event
//! - Inbound/outbound message contracts shared by the transport and the orchestrator

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod failure;
pub mod mock;
pub mod transport;

pub use crypto::secret_matches;
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::JsonBody;
pub use failure::{FailureContext, FailureSink, TracingFailureSink};
pub use transport::{ConversationId, InboundHandler, InboundMessage, MessageSender};
