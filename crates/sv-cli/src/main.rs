// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! sv - run scripts and commands inside named virtual environments

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use miette::Result;
use sv::Registry;

mod cmd_create;
mod cmd_list;
mod cmd_register;
mod deps;

use cmd_create::CmdCreate;
use cmd_list::CmdList;
use cmd_register::CmdRegister;
use deps::OsDeps;

#[derive(Parser)]
#[clap(
    name = "sv",
    about = "Run scripts and commands inside named virtual environments",
    version,
    disable_version_flag = true,
    long_about = "Invoke scripts and commands inside venvs declared by .sv_cfg files \
                  found along a configurable search path, without activating them"
)]
struct Opt {
    /// Print version
    #[clap(long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Where to look for .sv_cfg files ($PARENTS and $CWD are symbolic)
    #[clap(short = 'S', long = "config-search-path", env = "SV_SEARCH_PATH")]
    search_path: Option<String>,

    /// Report informational detail while processing
    #[clap(short = 'V', long)]
    verbose: bool,

    /// Suppress non-error log output
    #[clap(short, long)]
    quiet: bool,

    #[clap(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Register packages and their scripts in a venv
    #[clap(name = ":register")]
    Register(CmdRegister),

    /// Create or refresh a venv and apply its requirements
    #[clap(name = ":create")]
    Create(CmdCreate),

    /// List known scripts and venvs
    #[clap(name = ":list")]
    List(CmdList),

    /// Run a script alias or a command inside a named venv
    #[clap(external_subcommand)]
    Dispatch(Vec<String>),
}

impl Opt {
    fn run(self) -> Result<i32> {
        let log_level = match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, false) => tracing::Level::WARN,
            (false, true) => tracing::Level::INFO,
        };
        tracing_subscriber::fmt().with_max_level(log_level).init();

        let deps = Arc::new(OsDeps::new());
        let mut registry = Registry::new(deps);
        if let Some(search_path) = &self.search_path {
            registry.set_search_path(search_path);
        }
        if self.verbose {
            registry.set_verbose();
        }
        registry.load()?;

        match self.cmd {
            None => {
                Opt::command()
                    .print_help()
                    .map_err(|e| miette::miette!("Failed to print help: {e}"))?;
                Ok(0)
            }
            Some(Command::Register(mut cmd)) => cmd.run(&registry),
            Some(Command::Create(mut cmd)) => cmd.run(&registry),
            Some(Command::List(mut cmd)) => cmd.run(&registry),
            Some(Command::Dispatch(argv)) => {
                let Some((token, args)) = argv.split_first() else {
                    return Err(miette::miette!("Nothing to dispatch"));
                };
                Ok(sv::dispatch(&registry, token, args)?)
            }
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
