// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for dockerize operations.

use std::path::PathBuf;
use std::process::ExitStatus;

use miette::Diagnostic;
use thiserror::Error;

use crate::directive::{DirectiveKind, Location};

/// Convenience Result type with dockerize Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during dockerize operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// No units were given to build
    #[error("At least one package is required")]
    #[diagnostic(
        code(dockerize::no_units),
        help("The first package given is used as the image entrypoint")
    )]
    NoUnits,

    /// A named unit could not be located or its metadata loaded
    #[error("Cannot resolve package {name}: {reason}")]
    #[diagnostic(
        code(dockerize::unit_resolution),
        help("Check the import path and that it builds with 'go list'")
    )]
    UnitResolution { name: String, reason: String },

    /// Failed to read a source file of a unit
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(dockerize::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A comment carries the directive prefix but is not a valid directive
    #[error("{location}: invalid docker comment: {text} ({reason})")]
    #[diagnostic(
        code(dockerize::directive_syntax),
        help("Directives look like '//docker:<kind> <value>' where kind is one of: env, expose, install, repository, run, cmd, user")
    )]
    DirectiveSyntax {
        location: Location,
        text: String,
        reason: String,
    },

    /// A write-once directive was declared twice
    #[error("{location}: {kind} set twice (previously {previous:?})")]
    #[diagnostic(
        code(dockerize::conflict),
        help("Only one {} directive may be declared in the first package", kind)
    )]
    Conflict {
        kind: DirectiveKind,
        location: Location,
        previous: String,
    },

    /// An external program could not be started
    #[error("Failed to run {program}")]
    #[diagnostic(code(dockerize::command_failed))]
    CommandFailed {
        program: String,
        #[source]
        error: std::io::Error,
    },

    /// The compiler exited unsuccessfully
    #[error("Failed to compile {unit}: {status}")]
    #[diagnostic(code(dockerize::compile_failed))]
    CompileFailed { unit: String, status: ExitStatus },

    /// The image builder exited unsuccessfully
    #[error("Image build failed: {status}")]
    #[diagnostic(code(dockerize::image_build_failed))]
    ImageBuildFailed { status: ExitStatus },

    /// Invalid YAML in a project config file
    #[error("Invalid {path:?}: {error}")]
    #[diagnostic(
        code(dockerize::invalid_yaml),
        help("Check YAML syntax and ensure 'api: dockerize/v0' is present")
    )]
    InvalidYaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// Failed to write a generated artifact
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(code(dockerize::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(dockerize::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that mean the code could not be found or read,
    /// as opposed to the code's directives being malformed.
    pub fn is_unit_load_error(&self) -> bool {
        matches!(
            self,
            Error::UnitResolution { .. } | Error::ReadFailed { .. }
        )
    }
}
