// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `sv :list` command.

use clap::Args;
use miette::Result;
use sv::Registry;

/// List known scripts and venvs
#[derive(Debug, Args)]
pub struct CmdList {}

impl CmdList {
    pub fn run(&mut self, registry: &Registry) -> Result<i32> {
        registry.list();
        Ok(0)
    }
}
