// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! In-memory capability doubles shared by the module tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cfgfile::CfgDocument;
use crate::registry::RegistryDeps;
use crate::venv::{Venv, VenvRuntime, abs_path};
use crate::Result;

/// Records every venv runtime call instead of touching the OS.
#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub existing: RefCell<BTreeSet<PathBuf>>,
    pub runs: RefCell<Vec<(Vec<String>, BTreeMap<String, String>)>>,
    pub created: RefCell<Vec<(PathBuf, bool)>>,
    pub echoes: RefCell<Vec<String>>,
    pub exit_code: i32,
}

impl FakeRuntime {
    pub fn mark_existing(&self, path: &Path) {
        self.existing.borrow_mut().insert(path.to_path_buf());
    }

    pub fn argv(&self, call: usize) -> Vec<String> {
        self.runs.borrow()[call].0.clone()
    }
}

impl VenvRuntime for FakeRuntime {
    fn exists(&self, path: &Path) -> bool {
        self.existing.borrow().contains(path)
    }

    fn runner(&self, argv: &[String], env: &BTreeMap<String, String>) -> Result<i32> {
        self.runs.borrow_mut().push((argv.to_vec(), env.clone()));
        Ok(self.exit_code)
    }

    fn creator(&self, path: &Path, clear: bool) -> Result<()> {
        self.created.borrow_mut().push((path.to_path_buf(), clear));
        Ok(())
    }

    fn echo(&self, msg: &str) {
        self.echoes.borrow_mut().push(msg.to_string());
    }
}

/// In-memory registry dependencies backed by a [`FakeRuntime`].
///
/// Files are keyed by their resolved absolute path; script discovery maps
/// each package `p` to a single console script `p.script`.
#[derive(Default)]
pub(crate) struct FakeDeps {
    pub runtime: Arc<FakeRuntime>,
    pub files: RefCell<BTreeMap<PathBuf, String>>,
    pub written: RefCell<BTreeMap<PathBuf, String>>,
    pub echoes: RefCell<Vec<String>>,
    pub errors: RefCell<Vec<String>>,
}

impl FakeDeps {
    /// Register a config file under `rel`, resolved like the registry does.
    pub fn add_file(&self, rel: &str, content: &str) {
        self.files
            .borrow_mut()
            .insert(abs_path(Path::new(rel)), content.to_string());
    }

    /// Content written to `rel`, if any.
    pub fn written_to(&self, rel: &str) -> Option<String> {
        self.written.borrow().get(&abs_path(Path::new(rel))).cloned()
    }
}

impl RegistryDeps for FakeDeps {
    fn echo(&self, msg: &str) {
        self.echoes.borrow_mut().push(msg.to_string());
    }

    fn error(&self, msg: &str) {
        self.errors.borrow_mut().push(msg.to_string());
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn read(&self, path: &Path) -> Result<String> {
        Ok(self.files.borrow().get(path).cloned().unwrap_or_default())
    }

    fn write(&self, doc: &CfgDocument, path: &Path) -> Result<()> {
        self.written
            .borrow_mut()
            .insert(path.to_path_buf(), doc.to_string());
        Ok(())
    }

    fn scripts(&self, _venv: &Venv, packages: &[String]) -> Result<Vec<(String, String)>> {
        Ok(packages
            .iter()
            .map(|p| (p.clone(), format!("{p}.script")))
            .collect())
    }

    fn venv_runtime(&self) -> Arc<dyn VenvRuntime> {
        self.runtime.clone()
    }
}
