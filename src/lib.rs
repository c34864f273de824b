//! # wpsync
//!
//! Sync a local directory of markdown posts, pages, and media to a
//! WordPress site.
//!
//! Each run compares the files on disk with the manifests written by the
//! previous run and only sends what changed: files without a record are
//! created, files modified after their last sync are updated in full, and
//! everything else is left alone. Media is uploaded once.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌──────────┐
//! │ posts/   │──▶│  Scanner  │──▶│ Classifier │──▶│  Driver  │──▶ site API
//! │ pages/   │   └───────────┘   └─────▲──────┘   └────┬─────┘
//! │ media/   │                         │               │
//! └──────────┘                   ┌─────┴──────┐        │
//!                                │ Manifests  │◀───────┘
//!                                │ *.json     │
//!                                └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! wpsync init               # obtain a token, write wpsync.toml
//! wpsync check              # verify the token
//! wpsync sync --dry-run     # show what would be sent
//! wpsync sync               # create and update
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`frontmatter`] | Front-matter parsing |
//! | [`render`] | Markdown rendering |
//! | [`scan`] | Collection directory listing |
//! | [`manifest`] | Manifest load, fold, and write |
//! | [`classify`] | New / stale / unchanged partition |
//! | [`api`] | Remote API trait, HTTP client, dialects |
//! | [`reconcile`] | Create/update driver |
//! | [`sync`] | Per-run orchestration and reporting |
//! | [`auth`] | Token setup and validation |
//! | [`prompt`] | Interactive confirmation |

pub mod api;
pub mod auth;
pub mod classify;
pub mod config;
pub mod frontmatter;
pub mod manifest;
pub mod models;
pub mod prompt;
pub mod reconcile;
pub mod render;
pub mod scan;
pub mod sync;
