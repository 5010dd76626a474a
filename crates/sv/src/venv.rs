// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Virtual environment descriptor and its runtime capability.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{Result, SV_CFG_FILENAME, SV_DIR};

#[cfg(test)]
#[path = "./venv_test.rs"]
mod venv_test;

/// Name of the executable directory inside an environment.
#[cfg(windows)]
pub const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
pub const BIN_DIR: &str = "bin";

/// Platform suffix carried by environment executables.
pub const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;

/// OS capabilities required by a [`Venv`].
///
/// The descriptor itself never touches the filesystem or spawns processes;
/// everything goes through this trait so tests can substitute a fake.
pub trait VenvRuntime {
    /// True if `path` exists on the backing filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Spawn `argv` with `env` overlaid on the ambient process environment,
    /// block until completion, and return the exit code.
    fn runner(&self, argv: &[String], env: &BTreeMap<String, String>) -> Result<i32>;

    /// Materialize an isolated interpreter environment at `path`, including
    /// its own package installer. Wipes any existing contents when `clear`.
    fn creator(&self, path: &Path, clear: bool) -> Result<()>;

    /// Informational channel for user-facing messages.
    fn echo(&self, msg: &str);
}

/// One named virtual environment: where it lives and what goes into it.
#[derive(Clone)]
pub struct Venv {
    pub name: String,
    pub requirements: BTreeSet<String>,
    pub prerequisites: BTreeSet<String>,
    config_path: PathBuf,
    env_path: PathBuf,
    abs_path: PathBuf,
    runtime: Arc<dyn VenvRuntime>,
}

impl Venv {
    /// Build a descriptor from a config file's environment section.
    ///
    /// The environment folder is `<base>/.sv/<name>` where `base` is the
    /// `location` override when given (resolved against `config_path` if
    /// relative), or the config file's directory otherwise.
    pub fn new(
        name: &str,
        runtime: Arc<dyn VenvRuntime>,
        config_path: &Path,
        requirements: BTreeSet<String>,
        prerequisites: BTreeSet<String>,
        location: Option<&str>,
    ) -> Self {
        let base = match location {
            Some(loc) if !loc.is_empty() => config_path.join(loc),
            _ => config_path.to_path_buf(),
        };
        let env_path = strip_cur_dir(base.join(SV_DIR).join(name));
        let abs_path = abs_path(&env_path);
        Self {
            name: name.to_string(),
            requirements,
            prerequisites,
            config_path: config_path.to_path_buf(),
            env_path,
            abs_path,
            runtime,
        }
    }

    /// Descriptor with no requirements, rooted at `config_path`.
    pub fn bare(name: &str, runtime: Arc<dyn VenvRuntime>, config_path: &Path) -> Self {
        Self::new(
            name,
            runtime,
            config_path,
            BTreeSet::new(),
            BTreeSet::new(),
            None,
        )
    }

    /// Path where the environment is expected, as declared (possibly relative).
    pub fn env_path(&self) -> &Path {
        &self.env_path
    }

    /// Fully resolved path where the environment is expected.
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// True if the environment is present on disk.
    pub fn exists(&self) -> bool {
        self.runtime.exists(&self.abs_path)
    }

    /// Run `cmd` inside the environment, returning the child's exit code.
    ///
    /// A binary named `cmd` in the environment's executable directory is
    /// invoked directly; anything else runs through the environment's
    /// interpreter so that library modules work as pseudo-commands.
    /// A non-zero exit code is not an error here.
    pub fn run(&self, cmd: &str, args: &[String]) -> Result<i32> {
        let bin_path = self.bin_path();
        let cmd_path = bin_path.join(format!("{cmd}{EXE_SUFFIX}"));

        let mut argv = if self.runtime.exists(&cmd_path) {
            vec![cmd_path.to_string_lossy().into_owned()]
        } else {
            vec![
                self.interpreter_path().to_string_lossy().into_owned(),
                cmd.to_string(),
            ]
        };
        argv.extend(args.iter().cloned());

        self.runtime.runner(&argv, &self.env_overlay())
    }

    /// Install packages with the environment's own installer.
    pub fn install(&self, args: &[String]) -> Result<i32> {
        let mut argv = vec![
            self.interpreter_path().to_string_lossy().into_owned(),
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
        ];
        argv.extend(args.iter().cloned());

        self.runtime.runner(&argv, &self.env_overlay())
    }

    /// Ensure the environment exists, rebuilding it on request.
    ///
    /// Returns true when the environment was (re)built and the caller's
    /// requirement installation should follow; false when it was already
    /// present and left untouched.
    pub fn create(&self, clean: bool, update: bool) -> Result<bool> {
        if self.exists() {
            if clean {
                self.runtime.echo(&format!(
                    "Cleaning venv {} at {}",
                    self.name,
                    self.env_path.display()
                ));
            } else if update {
                self.runtime.echo(&format!(
                    "Updating venv {} at {}",
                    self.name,
                    self.env_path.display()
                ));
            } else {
                return Ok(false);
            }
        } else {
            self.runtime.echo(&format!(
                "Creating venv {} at {}",
                self.name,
                self.env_path.display()
            ));
        }

        self.runtime.creator(&self.abs_path, clean)?;

        if update {
            self.install(&["-U".to_string(), "pip".to_string()])?;
        }
        if !self.prerequisites.is_empty() {
            let prerequisites: Vec<String> = self.prerequisites.iter().cloned().collect();
            self.install(&prerequisites)?;
        }

        Ok(true)
    }

    fn bin_path(&self) -> PathBuf {
        self.abs_path.join(BIN_DIR)
    }

    fn interpreter_path(&self) -> PathBuf {
        self.bin_path().join(format!("python{EXE_SUFFIX}"))
    }

    /// Child process environment: VIRTUAL_ENV plus a PATH prefix.
    fn env_overlay(&self) -> BTreeMap<String, String> {
        let abs = self.abs_path.to_string_lossy().into_owned();
        let path = match std::env::var_os("PATH") {
            Some(ambient) => std::env::join_paths(
                std::iter::once(self.abs_path.clone()).chain(std::env::split_paths(&ambient)),
            )
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_else(|_| abs.clone()),
            None => abs.clone(),
        };

        BTreeMap::from([
            ("VIRTUAL_ENV".to_string(), abs),
            ("PATH".to_string(), path),
        ])
    }
}

impl std::fmt::Display for Venv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let missing = if self.exists() { "" } else { " !MISSING" };
        let config_file = strip_cur_dir(self.config_path.join(SV_CFG_FILENAME));
        write!(
            f,
            "{} ({}{}) [{}]",
            self.name,
            self.env_path.display(),
            missing,
            config_file.display()
        )
    }
}

impl std::fmt::Debug for Venv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Venv")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .field("prerequisites", &self.prerequisites)
            .field("config_path", &self.config_path)
            .field("env_path", &self.env_path)
            .field("abs_path", &self.abs_path)
            .finish()
    }
}

/// Resolve `path` to an absolute form: expand a leading `~`, anchor
/// relative paths at the current directory, and canonicalize when the
/// target already exists.
pub fn abs_path(path: &Path) -> PathBuf {
    let expanded = expand_user(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(_) => expanded,
        }
    };
    dunce::canonicalize(&absolute).unwrap_or(absolute)
}

fn expand_user(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Drop a leading `.` component so `./x/y` renders as `x/y`.
fn strip_cur_dir(path: PathBuf) -> PathBuf {
    match path.strip_prefix(".") {
        Ok(stripped) if !stripped.as_os_str().is_empty() => stripped.to_path_buf(),
        _ => path,
    }
}
