//! mail2issue: turns inbound email into issue-creation requests for an
//! agent runtime.

pub mod agent;
pub mod config;
pub mod context;
pub mod email;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod store;
