// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::testing::FakeDeps;

const CFG: &str = "[SCRIPTS]\nSample.py = test\n\n[test]\nrequirements = alpha\n";

#[fixture]
fn deps() -> Arc<FakeDeps> {
    Arc::new(FakeDeps::default())
}

fn registry_with(deps: &Arc<FakeDeps>, content: &str) -> Registry {
    deps.add_file(".sv_cfg", content);
    let mut registry = Registry::new(deps.clone());
    registry.set_search_path_tokens(["$CWD"]);
    registry.load().expect("load should succeed");
    registry
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[rstest]
fn test_dispatch_script_exists(deps: Arc<FakeDeps>) {
    let registry = registry_with(&deps, CFG);
    deps.runtime
        .mark_existing(registry.venvs()["test"].abs_path());

    let code = dispatch(&registry, "Sample.py", &args(&["--version"]))
        .expect("dispatch should succeed");

    assert_eq!(code, 0);
    assert!(deps.runtime.created.borrow().is_empty());
    let argv = deps.runtime.argv(0);
    assert_eq!(&argv[1..], ["Sample.py", "--version"]);
}

#[rstest]
fn test_dispatch_script_missing_creates_venv(deps: Arc<FakeDeps>) {
    let registry = registry_with(&deps, CFG);

    let code = dispatch(&registry, "Sample.py", &args(&["--version"]))
        .expect("dispatch should succeed");

    assert_eq!(code, 0);
    assert_eq!(deps.runtime.created.borrow().len(), 1);
    // Requirements install first, then the script itself
    assert_eq!(&deps.runtime.argv(0)[1..], ["-m", "pip", "install", "alpha"]);
    assert_eq!(&deps.runtime.argv(1)[1..], ["Sample.py", "--version"]);
}

#[rstest]
fn test_dispatch_venv_direct(deps: Arc<FakeDeps>) {
    let registry = registry_with(&deps, CFG);
    deps.runtime
        .mark_existing(registry.venvs()["test"].abs_path());

    let code =
        dispatch(&registry, "test", &args(&["--version"])).expect("dispatch should succeed");

    assert_eq!(code, 0);
    assert!(deps.runtime.created.borrow().is_empty());
    let argv = deps.runtime.argv(0);
    assert!(argv[0].contains("test"));
    assert_eq!(&argv[1..], ["--version"]);
}

#[rstest]
fn test_dispatch_venv_without_command(deps: Arc<FakeDeps>) {
    let registry = registry_with(&deps, CFG);
    deps.runtime
        .mark_existing(registry.venvs()["test"].abs_path());

    let code = dispatch(&registry, "test", &[]).expect("dispatch should succeed");

    assert_eq!(code, 1);
    assert_eq!(deps.errors.borrow().as_slice(), ["Insufficient parameters"]);
    assert!(deps.runtime.runs.borrow().is_empty());
    assert!(deps.runtime.created.borrow().is_empty());
}

#[rstest]
fn test_dispatch_unknown_token(deps: Arc<FakeDeps>) {
    let registry = registry_with(&deps, CFG);

    let code = dispatch(&registry, "nope", &[]).expect("dispatch should succeed");

    assert_eq!(code, 1);
    assert_eq!(
        deps.errors.borrow().as_slice(),
        ["Unknown script or venv: \"nope\""]
    );
    assert!(deps.runtime.runs.borrow().is_empty());
    assert!(deps.runtime.created.borrow().is_empty());
}

#[rstest]
fn test_dispatch_script_keeps_original_case(deps: Arc<FakeDeps>) {
    let registry = registry_with(&deps, CFG);
    deps.runtime
        .mark_existing(registry.venvs()["test"].abs_path());

    dispatch(&registry, "SAMPLE.PY", &[]).expect("dispatch should succeed");

    // Lookup is case-insensitive but the command keeps the user's casing
    assert_eq!(deps.runtime.argv(0)[1], "SAMPLE.PY");
}
