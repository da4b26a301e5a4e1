//! Scripts for building and upgrading the Jungle Run Move contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod builder;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod errors;
pub mod registry;
pub mod serializer;
pub mod submitter;
pub mod types;
pub mod utils;
