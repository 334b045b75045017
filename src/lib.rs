//! # Command Catalog
//!
//! Serves a catalog of command records (name, help text, syntax, donor and
//! permission metadata) as JSON over HTTP. Records live on disk as one JSON
//! file per command, grouped into category directories, inside a git
//! checkout that a background poller keeps in sync with a remote.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  pull  ┌──────────────┐  read  ┌───────────┐
//! │  Remote    │───────▶│   Mirror     │◀───────│  Catalog  │
//! │  git repo  │        │  checkout    │        │  loader   │
//! └────────────┘        └──────┬───────┘        └─────┬─────┘
//!                              │ POST /update         │ GET /cmds/...
//!                              ▼                      ▼
//!                        ┌──────────────────────────────┐
//!                        │        HTTP API (axum)       │
//!                        └──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cmdcat serve --repo-url https://github.com/org/commands.git
//! cmdcat list donor convert
//! cmdcat sync
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Command record and sync outcome |
//! | [`catalog`] | Directory-tree catalog loader and lookups |
//! | [`mirror`] | Git mirror sync cycle and background poller |
//! | [`server`] | HTTP API |

pub mod catalog;
pub mod config;
pub mod mirror;
pub mod models;
pub mod server;
