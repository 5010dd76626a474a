// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for sv operations.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Convenience Result type with sv Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during sv operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Malformed `.sv_cfg` content
    #[error("Invalid config file {path}: {message} (line {line})")]
    #[diagnostic(
        code(sv::invalid_config),
        help("Check the .sv_cfg syntax: [section] headers, key = value entries")
    )]
    InvalidConfig {
        path: String,
        line: usize,
        message: String,
    },

    /// Failed to read a config file
    #[error("Failed to read config file: {path:?}")]
    #[diagnostic(code(sv::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write a config file
    #[error("Failed to write config file: {path:?}")]
    #[diagnostic(code(sv::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to spawn a child process
    #[error("Failed to execute {command}")]
    #[diagnostic(code(sv::exec_failed))]
    ExecFailed {
        command: String,
        #[source]
        error: std::io::Error,
    },

    /// Environment creation failed
    #[error("Failed to create venv at {path:?}: {message}")]
    #[diagnostic(
        code(sv::create_failed),
        help("Check that a python interpreter with the venv module is on PATH")
    )]
    CreateFailed { path: PathBuf, message: String },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(sv::io_error))]
    Io(#[from] std::io::Error),
}
