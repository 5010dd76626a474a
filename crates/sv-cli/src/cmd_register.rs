// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `sv :register` command.

use clap::Args;
use miette::Result;
use sv::Registry;

/// Register packages and their scripts in a venv
#[derive(Debug, Args)]
pub struct CmdRegister {
    /// Directory whose .sv_cfg receives the registration
    #[clap(short = 'P', long = "config-path")]
    pub config_path: Option<String>,

    /// Base directory override for where the venv lives
    #[clap(short = 'V', long = "venv-path")]
    pub venv_path: Option<String>,

    /// Venv to register the packages into
    pub venv: String,

    /// Packages to install and scan for console scripts
    pub packages: Vec<String>,
}

impl CmdRegister {
    pub fn run(&mut self, registry: &Registry) -> Result<i32> {
        if self.packages.is_empty() {
            return Ok(0);
        }
        registry.register(
            &self.venv,
            &self.packages,
            self.config_path.as_deref(),
            self.venv_path.as_deref(),
        )?;
        Ok(0)
    }
}
