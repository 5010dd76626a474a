// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Configuration discovery, merging, and registration.
//!
//! A registry walks an ordered search path, loads every `.sv_cfg` it finds,
//! and merges the declarations into two flat maps: script alias -> venv
//! name, and venv name -> [`Venv`]. Environments are first-writer-wins
//! across the search path; script aliases are last-writer-wins.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cfgfile::CfgDocument;
use crate::venv::{Venv, VenvRuntime, abs_path};
use crate::{Result, SV_CFG_FILENAME};

#[cfg(test)]
#[path = "./registry_test.rs"]
mod registry_test;

const SCRIPTS_SECTION: &str = "SCRIPTS";
const REQUIREMENTS_KEY: &str = "requirements";
const PREREQUISITES_KEY: &str = "prerequisites";
const LOCATION_KEY: &str = "location";

/// Capabilities the registry requires from its environment.
pub trait RegistryDeps {
    /// Informational channel for user-facing messages.
    fn echo(&self, msg: &str);

    /// Diagnostic channel for user-input errors.
    fn error(&self, msg: &str);

    /// True if `path` exists on the backing filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Read the full contents of a config file.
    fn read(&self, path: &Path) -> Result<String>;

    /// Persist `doc` at `path` as a full rewrite.
    fn write(&self, doc: &CfgDocument, path: &Path) -> Result<()>;

    /// Install `packages` into `venv` and enumerate the console scripts
    /// they provide, as `(package, script)` pairs.
    fn scripts(&self, venv: &Venv, packages: &[String]) -> Result<Vec<(String, String)>>;

    /// Runtime handed to every [`Venv`] this registry constructs.
    fn venv_runtime(&self) -> Arc<dyn VenvRuntime>;
}

/// Layered `.sv_cfg` configuration merged over a search path.
pub struct Registry {
    deps: Arc<dyn RegistryDeps>,
    search_path: Vec<String>,
    scripts: BTreeMap<String, String>,
    venvs: BTreeMap<String, Venv>,
    loaded: BTreeSet<String>,
    verbose: bool,
}

impl Registry {
    pub fn new(deps: Arc<dyn RegistryDeps>) -> Self {
        Self {
            deps,
            search_path: vec![
                "~/.config".to_string(),
                "$PARENTS".to_string(),
                "$CWD".to_string(),
            ],
            scripts: BTreeMap::new(),
            venvs: BTreeMap::new(),
            loaded: BTreeSet::new(),
            verbose: false,
        }
    }

    /// Replace the search path from a platform path-list string.
    pub fn set_search_path(&mut self, spec: &str) {
        self.search_path = std::env::split_paths(spec)
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
    }

    /// Replace the search path with explicit tokens.
    pub fn set_search_path_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_path = tokens.into_iter().map(Into::into).collect();
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self) {
        self.verbose = true;
    }

    /// Informational message, emitted only in verbose mode.
    pub fn info(&self, msg: &str) {
        if self.verbose {
            self.deps.echo(msg);
        }
    }

    pub fn deps(&self) -> &dyn RegistryDeps {
        &*self.deps
    }

    /// Script alias -> venv name, read-only.
    pub fn scripts(&self) -> &BTreeMap<String, String> {
        &self.scripts
    }

    /// Venv name -> descriptor, read-only.
    pub fn venvs(&self) -> &BTreeMap<String, Venv> {
        &self.venvs
    }

    /// Config file identifiers successfully loaded so far.
    pub fn loaded_paths(&self) -> &BTreeSet<String> {
        &self.loaded
    }

    /// Expand the search path into concrete candidate directories.
    ///
    /// `$CWD` becomes `.`; `$PARENTS` becomes every directory from the
    /// filesystem root to the current working directory inclusive, yielded
    /// root-first. Anything else passes through as a literal path.
    pub fn config_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for token in &self.search_path {
            match token.to_uppercase().as_str() {
                "$PARENTS" => {
                    let Ok(cwd) = std::env::current_dir() else {
                        continue;
                    };
                    let mut ancestors: Vec<PathBuf> =
                        cwd.ancestors().map(Path::to_path_buf).collect();
                    ancestors.reverse();
                    paths.extend(ancestors);
                }
                "$CWD" => paths.push(PathBuf::from(".")),
                _ => paths.push(PathBuf::from(token)),
            }
        }
        paths
    }

    /// Load every config file found along the expanded search path.
    pub fn load(&mut self) -> Result<()> {
        for dir in self.config_paths() {
            self.load_file(&dir)?;
        }
        Ok(())
    }

    fn load_file(&mut self, dir: &Path) -> Result<()> {
        let config_file = strip_cur_dir(dir.join(SV_CFG_FILENAME));
        let file_id = config_file.display().to_string();
        let file_path = abs_path(&config_file);

        if !self.deps.exists(&file_path) {
            return Ok(());
        }
        tracing::debug!(config = %file_id, "loading config file");

        let text = self.deps.read(&file_path)?;
        let doc = CfgDocument::parse(&text, &file_id)?;

        for section in doc.section_names().map(str::to_string).collect::<Vec<_>>() {
            if !is_lowercase_name(&section) {
                continue;
            }
            if self.venvs.contains_key(&section) {
                // First writer wins for environments
                continue;
            }
            let venv = Venv::new(
                &section,
                self.deps.venv_runtime(),
                dir,
                packages_section(&doc, &section, REQUIREMENTS_KEY),
                packages_section(&doc, &section, PREREQUISITES_KEY),
                doc.get(&section, LOCATION_KEY),
            );
            self.venvs.insert(section, venv);
        }

        let aliases: Vec<(String, String)> = doc
            .items(SCRIPTS_SECTION)
            .map(|(alias, target)| {
                let target = match target {
                    Some(t) if !t.is_empty() => t,
                    _ => alias,
                };
                (alias.to_string(), target.to_string())
            })
            .collect();
        for (alias, target) in aliases {
            // Last writer wins for aliases
            self.scripts.insert(alias, target.clone());
            if !self.venvs.contains_key(&target) {
                let venv = Venv::bare(&target, self.deps.venv_runtime(), dir);
                self.venvs.insert(target, venv);
            }
        }

        let mut ignored: Vec<&str> = doc
            .section_names()
            .filter(|s| !is_lowercase_name(s) && *s != SCRIPTS_SECTION)
            .collect();
        if !ignored.is_empty() {
            ignored.sort_unstable();
            self.deps.echo(&format!(
                "Ignored the following sections of {}: {}",
                file_id,
                ignored.join(", ")
            ));
        }

        self.loaded.insert(file_id);
        Ok(())
    }

    /// Resolve a script alias or venv name to its descriptor.
    ///
    /// Aliases take precedence over coincidentally equal venv names.
    pub fn resolve(&self, name_or_script: &str) -> Option<&Venv> {
        let key = name_or_script.to_lowercase();
        match self.scripts.get(&key) {
            Some(target) => self.venvs.get(target),
            None => self.venvs.get(&key),
        }
    }

    /// Create or refresh a venv and apply its requirements.
    ///
    /// Returns the installer's exit code, or 1 when the name is unknown.
    pub fn create(
        &self,
        venv_or_script: &str,
        extra_params: &[String],
        clean: bool,
        update: bool,
    ) -> Result<i32> {
        let Some(venv) = self.resolve(venv_or_script) else {
            self.deps
                .error(&format!("Unable to find venv or script {venv_or_script}"));
            return Ok(1);
        };

        if !venv.create(clean, update)? {
            self.info(&format!(
                "Using venv {} at {}",
                venv.name,
                venv.env_path().display()
            ));
        }

        let mut install_params: Vec<String> = Vec::new();
        if update {
            install_params.push("-U".to_string());
        }
        install_params.extend(venv.requirements.iter().cloned());
        install_params.extend(extra_params.iter().cloned());

        venv.install(&install_params)
    }

    /// Register packages (and the scripts they provide) into a config file.
    ///
    /// Only the single target file is touched; the venv section's
    /// requirements become the sorted union of old and new packages.
    pub fn register(
        &self,
        name: &str,
        packages: &[String],
        config_path: Option<&str>,
        venv_path: Option<&str>,
    ) -> Result<()> {
        let target_dir = match config_path {
            Some(path) => PathBuf::from(path),
            None => {
                let default = self
                    .config_paths()
                    .pop()
                    .unwrap_or_else(|| PathBuf::from("."));
                self.info(&format!(
                    "Defaulting config path to {}",
                    default.display()
                ));
                default
            }
        };
        let config_file = strip_cur_dir(target_dir.join(SV_CFG_FILENAME));
        let file_id = config_file.display().to_string();
        let file_path = abs_path(&config_file);

        let mut doc = if self.deps.exists(&file_path) {
            CfgDocument::parse(&self.deps.read(&file_path)?, &file_id)?
        } else {
            CfgDocument::new()
        };
        doc.add_section(SCRIPTS_SECTION);

        let requirements = packages_section(&doc, name, REQUIREMENTS_KEY);
        let venv = Venv::new(
            name,
            self.deps.venv_runtime(),
            &target_dir,
            requirements.clone(),
            packages_section(&doc, name, PREREQUISITES_KEY),
            venv_path,
        );

        for (package, script) in self.deps.scripts(&venv, packages)? {
            self.deps.echo(&format!(
                "Registering {script} from {package} into {name}"
            ));
            doc.set(SCRIPTS_SECTION, &script, Some(name));
        }

        doc.add_section(name);
        let merged: BTreeSet<String> = requirements
            .into_iter()
            .chain(packages.iter().cloned())
            .collect();
        let merged = merged.into_iter().collect::<Vec<_>>().join("\n");
        doc.set(name, REQUIREMENTS_KEY, Some(&merged));

        tracing::debug!(config = %file_id, venv = name, "writing registration");
        self.deps.write(&doc, &file_path)
    }

    /// Report loaded config files and every known venv.
    pub fn list(&self) {
        let loaded: Vec<&str> = self.loaded.iter().map(String::as_str).collect();
        self.deps
            .echo(&format!("Config Paths: {}", loaded.join(", ")));

        let mut aliases: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (script, target) in &self.scripts {
            aliases.entry(target).or_default().insert(script);
        }

        for (name, venv) in &self.venvs {
            self.deps.echo(&venv.to_string());
            if let Some(scripts) = aliases.get(name.as_str()) {
                let scripts: Vec<&str> = scripts.iter().copied().collect();
                self.deps
                    .echo(&format!("\tScripts: {}", scripts.join(", ")));
            }
            if !venv.prerequisites.is_empty() {
                let prerequisites: Vec<&str> =
                    venv.prerequisites.iter().map(String::as_str).collect();
                self.deps.echo(&format!(
                    "\tPrerequisites: {}",
                    prerequisites.join("\n\t\t")
                ));
            }
            if !venv.requirements.is_empty() {
                let requirements: Vec<&str> =
                    venv.requirements.iter().map(String::as_str).collect();
                self.deps.echo(&format!(
                    "\tRequirements: {}",
                    requirements.join("\n\t\t")
                ));
            }
        }
    }
}

/// A section name declares an environment when it is written entirely in
/// lower case (at least one cased character, none upper case).
fn is_lowercase_name(name: &str) -> bool {
    name.chars().any(char::is_lowercase) && !name.chars().any(char::is_uppercase)
}

/// Newline-separated package list from a section key.
fn packages_section(doc: &CfgDocument, section: &str, key: &str) -> BTreeSet<String> {
    doc.get(section, key)
        .unwrap_or("")
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_cur_dir(path: PathBuf) -> PathBuf {
    match path.strip_prefix(".") {
        Ok(stripped) if !stripped.as_os_str().is_empty() => stripped.to_path_buf(),
        _ => path,
    }
}
