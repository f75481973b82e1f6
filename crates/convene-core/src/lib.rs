//! convene-core — Pure domain logic, no UI.
//!
//! This crate contains the experiment, stage, and chat logic for the
//! Convene deliberation platform: stage configuration builders, chat
//! message conversion for LLM prompts, the agent mediator loop, and the
//! response timeout tracker. It is completely UI-agnostic — frontends
//! subscribe to session events via tokio::broadcast.

pub mod chat;
pub mod config;
pub mod convert;
pub mod events;
pub mod experiment;
pub mod mediator;
pub mod output;
pub mod profiles;
pub mod providers;
pub mod session;
pub mod stages;
pub mod timeout;
pub mod types;
