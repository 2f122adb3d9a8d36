// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! dockerize - Docker images from Go packages
//!
//! This crate derives a Dockerfile and a companion build script from
//! directives embedded in the comments of Go packages, so that packaging
//! metadata lives next to the code it describes.
//!
//! # Overview
//!
//! Packages are processed in the order given. The first one is the entry
//! package: its binary becomes the image entrypoint and only its `env`,
//! `expose`, `cmd` and `user` directives are honored. `install`,
//! `repository` and `run` directives accumulate from every package.
//!
//! # Example
//!
//! ```go
//! // Command frontend serves the web UI.
//! package main
//!
//! //docker:install git
//! //docker:env LOG_LEVEL=info
//! //docker:expose 3080
//! //docker:user sourcegraph /data
//! //docker:cmd ["serve"]
//! ```

pub mod config;
pub mod descriptor;
pub mod directive;
pub mod error;
pub mod merge;
pub mod parser;
pub mod pipeline;
pub mod script;
pub mod source;
pub mod unit;

pub use config::{BuildOptions, ProjectConfig};
pub use descriptor::{Descriptor, Instruction};
pub use directive::{Directive, DirectiveKind, Location, Placement};
pub use error::{Error, Result};
pub use merge::{AccumulatedConfig, IgnoredDirective, merge_units};
pub use parser::{ParsedUnit, parse_unit};
pub use pipeline::{
    Artifacts, Compiler, DockerBuilder, GoCompiler, ImageBuilder, Plan, build, plan,
    write_artifacts,
};
pub use script::ScriptOptions;
pub use unit::{GoListLoader, Unit, UnitLoader};

/// Prefix identifying a directive comment.
pub const DIRECTIVE_PREFIX: &str = "//docker:";

/// Alpine doesn't do point releases; 3.8 resolves to 3.8.1 or newer,
/// which contains the fix for the apk remote code execution bug.
pub const DEFAULT_BASE_IMAGE: &str = "alpine:3.8";

/// Packages installed in every image. mailcap provides /etc/mime.types.
pub const BASELINE_PACKAGES: [&str; 3] = ["ca-certificates", "mailcap", "tini"];

/// Well-known filename for the generated image descriptor.
pub const DOCKERFILE_FILENAME: &str = "Dockerfile";

/// Well-known filename for the generated build script.
pub const BUILD_SCRIPT_FILENAME: &str = "build.sh";

/// Well-known filename for project defaults.
pub const CONFIG_FILENAME: &str = ".dockerize.yaml";

/// Environment for every compile: static linux/amd64 binaries.
pub const CROSS_COMPILE_ENV: [(&str, &str); 3] =
    [("GOARCH", "amd64"), ("GOOS", "linux"), ("CGO_ENABLED", "0")];

/// Arguments given to every `go build` after any user flags.
pub const GO_BUILD_ARGS: [&str; 4] = ["-buildmode", "exe", "-tags", "dist"];
