//! `vcstamp_core` is the core library for vcstamp, a build step that writes a
//! version stamped file from a template. Tokens such as `$REVNUM$` or
//! `$DATE$` in the template are replaced with facts scraped from the active
//! version control system (Git, Mercurial or Subversion) and from the build
//! environment.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template file
//!   → TokenRegistry (runs each registered token over the content, in order)
//!   → Fact provider (GitProvider / HgProvider / SvnProvider, memoized)
//!   → ProcessRunner (launches git / hg / svn and streams stdout lines)
//!   → Destination file (written only when the content changed)
//! ```
//!
//! ## Token Grammar
//!
//! - `$NAME$`
//! - `$NAME(123)$`
//! - `$NAME("text")$`
//! - `$NAME("text","text")$`
//!
//! A fragment that does not fit the shape of a registered token is left
//! untouched.
//!
//! ## Key Types
//!
//! - [`ProcessRunner`] runs one version control executable and maps launch
//!   and exit failures onto [`VcstampError`].
//! - [`GitProvider`], [`HgProvider`] and [`SvnProvider`] compute each fact at
//!   most once.
//! - [`TokenRegistry`] holds the ordered token handlers and performs the
//!   replacement.
//! - [`Stamper`] is a wired registry with its version control system erased.
//! - [`VcstampConfig`] is the configuration loaded from `vcstamp.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use vcstamp_core::StampOptions;
//! use vcstamp_core::VcstampConfig;
//! use vcstamp_core::build_stamper;
//! use vcstamp_core::render_stamp;
//! use vcstamp_core::write_stamp;
//!
//! let root = Path::new(".");
//! let config = VcstampConfig::load(root).unwrap();
//! let options = StampOptions::from_config(root, config.as_ref());
//! let mut stamper = build_stamper(&options);
//!
//! for job in options.stamp_jobs().unwrap() {
//!     let outcome = render_stamp(stamper.as_mut(), root, job).unwrap();
//!     write_stamp(&outcome).unwrap();
//! }
//! ```

pub use config::*;
pub use engine::*;
pub use environment::*;
pub use error::*;
pub use facts::*;
pub use git::*;
pub use hg::*;
pub use lexer::*;
pub use process::*;
pub use stamp::*;
pub use svn::*;
pub use tokens::*;
pub use vcs::*;
pub use wiring::*;

pub mod config;
mod engine;
mod environment;
#[allow(unused_assignments)]
mod error;
mod facts;
mod git;
mod hg;
mod lexer;
mod process;
mod stamp;
mod svn;
mod tokens;
mod vcs;
mod wiring;

#[cfg(test)]
mod __fixtures;
