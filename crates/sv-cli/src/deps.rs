// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! OS-backed implementations of the library's capability traits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use colored::Colorize;
use sv::cfgfile::CfgDocument;
use sv::registry::RegistryDeps;
use sv::venv::{Venv, VenvRuntime};
use sv::{Error, Result};

#[cfg(test)]
#[path = "./deps_test.rs"]
mod deps_test;

/// Interpreter used to materialize environments, overridable via SV_PYTHON.
fn system_python() -> String {
    std::env::var("SV_PYTHON").unwrap_or_else(|_| {
        if cfg!(windows) { "python" } else { "python3" }.to_string()
    })
}

/// Venv runtime backed by the real filesystem and process spawning.
#[derive(Default)]
pub struct OsVenvRuntime;

impl VenvRuntime for OsVenvRuntime {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn runner(&self, argv: &[String], env: &BTreeMap<String, String>) -> Result<i32> {
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::ExecFailed {
                command: String::new(),
                error: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
            });
        };
        tracing::debug!(command = %argv.join(" "), "spawning");

        let status = Command::new(program)
            .args(args)
            .envs(env)
            .status()
            .map_err(|error| Error::ExecFailed {
                command: program.clone(),
                error,
            })?;
        Ok(status.code().unwrap_or(1))
    }

    fn creator(&self, path: &Path, clear: bool) -> Result<()> {
        let python = system_python();
        let mut command = Command::new(&python);
        command.args(["-m", "venv"]);
        if clear {
            command.arg("--clear");
        }
        command.arg(path);
        tracing::debug!(venv = %path.display(), python = %python, clear, "creating venv");

        let status = command.status().map_err(|error| Error::ExecFailed {
            command: python.clone(),
            error,
        })?;
        if !status.success() {
            return Err(Error::CreateFailed {
                path: path.to_path_buf(),
                message: format!("{python} -m venv exited with {status}"),
            });
        }
        Ok(())
    }

    fn echo(&self, msg: &str) {
        println!("{msg}");
    }
}

/// Registry dependencies backed by the real filesystem.
pub struct OsDeps {
    runtime: Arc<OsVenvRuntime>,
}

impl OsDeps {
    pub fn new() -> Self {
        Self {
            runtime: Arc::new(OsVenvRuntime),
        }
    }
}

impl Default for OsDeps {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryDeps for OsDeps {
    fn echo(&self, msg: &str) {
        println!("{msg}");
    }

    fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
            path: path.to_path_buf(),
            error,
        })
    }

    fn write(&self, doc: &CfgDocument, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| Error::WriteFailed {
                path: path.to_path_buf(),
                error,
            })?;
        }
        std::fs::write(path, doc.to_string()).map_err(|error| Error::WriteFailed {
            path: path.to_path_buf(),
            error,
        })
    }

    fn scripts(&self, venv: &Venv, packages: &[String]) -> Result<Vec<(String, String)>> {
        if venv.create(false, false)? && !venv.requirements.is_empty() {
            let requirements: Vec<String> = venv.requirements.iter().cloned().collect();
            venv.install(&requirements)?;
        }
        if packages.is_empty() {
            return Ok(Vec::new());
        }
        venv.install(packages)?;

        let site_dirs = site_packages_dirs(venv.abs_path());
        if site_dirs.is_empty() {
            self.echo(&format!(
                "Unable to locate site-packages for {venv}; skipping script discovery"
            ));
            return Ok(Vec::new());
        }
        Ok(collect_console_scripts(&site_dirs, packages))
    }

    fn venv_runtime(&self) -> Arc<dyn VenvRuntime> {
        self.runtime.clone()
    }
}

/// Candidate site-packages directories for an environment root.
fn site_packages_dirs(venv_path: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for fixed in [
        venv_path.join("lib").join("site-packages"),
        venv_path.join("Lib").join("site-packages"),
    ] {
        if fixed.is_dir() {
            dirs.push(fixed);
        }
    }
    // POSIX layout: lib/python3.X/site-packages
    if let Ok(entries) = std::fs::read_dir(venv_path.join("lib")) {
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().starts_with("python") {
                continue;
            }
            let candidate = entry.path().join("site-packages");
            if candidate.is_dir() {
                dirs.push(candidate);
            }
        }
    }
    dirs
}

/// Console scripts declared by each package's installed metadata.
///
/// Scans `<pkg>-<version>.dist-info/entry_points.txt` for a
/// `[console_scripts]` section; packages without one yield nothing.
fn collect_console_scripts(site_dirs: &[PathBuf], packages: &[String]) -> Vec<(String, String)> {
    let mut scripts = Vec::new();
    for package in packages {
        for dist_info in find_dist_info(site_dirs, package) {
            let entry_points = dist_info.join("entry_points.txt");
            let Ok(text) = std::fs::read_to_string(&entry_points) else {
                continue;
            };
            let Ok(doc) = CfgDocument::parse(&text, &entry_points.display().to_string()) else {
                tracing::debug!(path = %entry_points.display(), "unparseable entry_points.txt");
                continue;
            };
            for (script, _) in doc.items("console_scripts") {
                scripts.push((package.clone(), script.to_string()));
            }
        }
    }
    scripts
}

fn find_dist_info(site_dirs: &[PathBuf], package: &str) -> Vec<PathBuf> {
    let wanted = normalize_package_name(package);
    let mut found = Vec::new();
    for dir in site_dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(".dist-info") else {
                continue;
            };
            let dist_name = stem.split('-').next().unwrap_or(stem);
            if normalize_package_name(dist_name) == wanted {
                found.push(entry.path());
            }
        }
    }
    found
}

fn normalize_package_name(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}
