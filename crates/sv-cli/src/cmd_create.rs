// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `sv :create` command.

use clap::Args;
use miette::Result;
use sv::Registry;

/// Create or refresh a venv and apply its requirements
#[derive(Debug, Args)]
pub struct CmdCreate {
    /// Wipe and rebuild the venv if it already exists
    #[clap(short = 'C', long)]
    pub clean: bool,

    /// Rebuild the venv and upgrade its tooling and requirements
    #[clap(short = 'U', long)]
    pub update: bool,

    /// Venv or script name to create
    pub venv_or_script: String,

    /// Extra arguments appended to the installer invocation
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub install_params: Vec<String>,
}

impl CmdCreate {
    pub fn run(&mut self, registry: &Registry) -> Result<i32> {
        let code = registry.create(
            &self.venv_or_script,
            &self.install_params,
            self.clean,
            self.update,
        )?;
        Ok(code)
    }
}
