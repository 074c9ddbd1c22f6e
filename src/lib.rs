//! jabberwocky: a language server for Sins of a Solar Empire II mod data
//!
//! Entity files (`.unit`, `.weapon`, `.player`, ...) are JSON documents
//! whose string values refer to other entities, localization keys, textures
//! and weapon tags. This crate indexes a mod folder and checks those
//! references while the files are edited.
//!
//! # Overview
//!
//! - **Diagnostics**: unresolved references, manifest registration, syntax
//!   and schema errors
//! - **Completion**: identifiers of the referenced category, schema enums and
//!   `{icon:...}` tokens in localized text
//! - **Go to definition** and **hover** for every reference category
//! - **Symbols**: document outline and workspace-wide entity search
//!
//! # Architecture
//!
//! - [`pointer`]: the reference categories ("pointer types")
//! - [`schema`]: game schemas annotated with pointer markers, and the matcher
//!   mapping them onto a document
//! - [`index`]: identifier indices built from one scan of the mod folder
//! - [`context`]: which category the value under the cursor refers to
//! - [`engine`]: the indexed workspace and its lifecycle
//! - [`server`]: the tower-lsp backend
//!
//! ```ignore
//! use jabberwocky::config::Settings;
//! use jabberwocky::engine::EngineContext;
//!
//! let engine = EngineContext::build(&mod_path, Settings::default());
//! let reports = jabberwocky::diagnostics::check_workspace(&engine);
//! ```

// Document model and schemas
pub mod json;
pub mod pointer;
pub mod schema;

// Workspace state
pub mod engine;
pub mod index;

// LSP feature modules
pub mod completion;
pub mod context;
pub mod diagnostics;
pub mod gotodef;
pub mod hover;
pub mod requests;
pub mod symbol;

// Server and ambient concerns
pub mod config;
pub mod error;
pub mod logging;
pub mod server;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
