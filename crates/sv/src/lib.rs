// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! sv - run scripts and commands inside named virtual environments
//!
//! This crate provides the core library for the `sv` command line tool:
//! layered configuration files (`.sv_cfg`) discovered along a search path
//! declare named virtual environments and script aliases, and the dispatch
//! resolver runs commands inside those environments without requiring the
//! user to activate them.
//!
//! # Example
//!
//! ```ini
//! # .sv_cfg
//! [SCRIPTS]
//! cookiecutter = cc
//!
//! [cc]
//! requirements =
//!     cookiecutter
//!     pipdeptree
//! ```
//!
//! With the above in the current directory, `sv cookiecutter ...` creates
//! the `cc` environment on first use, installs its requirements, and runs
//! `cookiecutter` inside it.

pub mod cfgfile;
pub mod dispatch;
pub mod error;
pub mod registry;
#[cfg(test)]
pub(crate) mod testing;
pub mod venv;

pub use cfgfile::CfgDocument;
pub use dispatch::dispatch;
pub use error::{Error, Result};
pub use registry::{Registry, RegistryDeps};
pub use venv::{Venv, VenvRuntime, abs_path};

/// Well-known filename for configuration files.
pub const SV_CFG_FILENAME: &str = ".sv_cfg";

/// Directory under which environments are materialized (`<base>/.sv/<name>`).
pub const SV_DIR: &str = ".sv";
