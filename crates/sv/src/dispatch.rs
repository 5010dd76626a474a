// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Fallback command dispatch: run a token inside the venv it names.

use crate::registry::Registry;
use crate::venv::Venv;
use crate::Result;

#[cfg(test)]
#[path = "./dispatch_test.rs"]
mod dispatch_test;

/// Resolve `token` against the registry and run the requested command.
///
/// A script alias runs the alias itself inside its venv; a bare venv name
/// takes the first argument as the command. The environment is created on
/// demand, installing its requirements when freshly built. Unknown tokens
/// and missing arguments are reported on the error channel and yield exit
/// code 1 without touching the filesystem.
pub fn dispatch(registry: &Registry, token: &str, args: &[String]) -> Result<i32> {
    let name = token.to_lowercase();

    if let Some(target) = registry.scripts().get(&name) {
        let Some(venv) = registry.venvs().get(target) else {
            registry
                .deps()
                .error(&format!("Unknown script or venv: \"{token}\""));
            return Ok(1);
        };
        return run_in(venv, token, args);
    }

    if let Some(venv) = registry.venvs().get(&name) {
        let Some((cmd, rest)) = args.split_first() else {
            registry.deps().error("Insufficient parameters");
            return Ok(1);
        };
        return run_in(venv, cmd, rest);
    }

    registry
        .deps()
        .error(&format!("Unknown script or venv: \"{token}\""));
    Ok(1)
}

fn run_in(venv: &Venv, cmd: &str, args: &[String]) -> Result<i32> {
    if venv.create(false, false)? && !venv.requirements.is_empty() {
        let requirements: Vec<String> = venv.requirements.iter().cloned().collect();
        venv.install(&requirements)?;
    }
    venv.run(cmd, args)
}
