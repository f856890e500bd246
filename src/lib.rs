//! insdb library crate.
//!
//! The primary interface is the `insdb` binary. The library exposes the
//! document model, ordered mutation, merge engine and edit round-trip so
//! integration tests and other tools can drive them without the CLI.
//!
//! Every operation follows the same shape: [`store::Store::load`] a
//! [`document::Document`], hand it to a [`catalog`] function which returns
//! the updated document, then [`store::Store::save`] it.

pub mod catalog;
pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod format;
pub mod merge;
pub mod model;
pub mod patch;
pub mod prompt;
pub mod render;
pub mod store;
pub mod telemetry;
pub mod xml;

#[cfg(test)]
mod testing;
