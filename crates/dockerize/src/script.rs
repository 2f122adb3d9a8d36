// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Companion build script synthesis.

use std::fmt::Write;

use shell_words::quote;

use crate::merge::AccumulatedConfig;
use crate::unit::Unit;
use crate::{CROSS_COMPILE_ENV, DOCKERFILE_FILENAME, GO_BUILD_ARGS};

#[cfg(test)]
#[path = "./script_test.rs"]
mod script_test;

/// Inputs of the build script besides the merged configuration.
#[derive(Debug, Clone, Default)]
pub struct ScriptOptions {
    /// Image name used when `$IMAGE` is not set; defaults to the entry
    /// unit's basename.
    pub tag: Option<String>,
    /// Extra flags for every `go build`.
    pub go_build_flags: Vec<String>,
}

/// Generate a bash script that compiles every package and builds the
/// image from the Dockerfile sitting next to it.
///
/// The script lives in the entry unit's directory and changes to the
/// module root before building, so it can be run from anywhere.
pub fn synthesize(config: &AccumulatedConfig, entry: &Unit, options: &ScriptOptions) -> String {
    let mut out = String::new();
    write_script(&mut out, config, entry, options).expect("writing to a String cannot fail");
    out
}

fn write_script(
    out: &mut String,
    config: &AccumulatedConfig,
    entry: &Unit,
    options: &ScriptOptions,
) -> std::fmt::Result {
    writeln!(out, "#!/usr/bin/env bash")?;
    writeln!(out)?;
    writeln!(out, "# This file was generated by dockerize. Do not edit.")?;
    writeln!(out)?;
    writeln!(out, "set -euo pipefail")?;

    let up = "/..".repeat(entry.depth());
    writeln!(out, "cd \"$(dirname \"${{BASH_SOURCE[0]}}\"){up}\"")?;
    writeln!(out)?;

    writeln!(out, "OUTPUT=$(mktemp -d -t dockerize_XXXXXXX)")?;
    writeln!(out, "cleanup() {{")?;
    writeln!(out, "    rm -rf \"$OUTPUT\"")?;
    writeln!(out, "}}")?;
    writeln!(out, "trap cleanup EXIT")?;
    writeln!(out)?;

    for (name, value) in CROSS_COMPILE_ENV {
        writeln!(out, "export {name}={value}")?;
    }
    writeln!(out)?;

    for package in &config.packages {
        let basename = package.rsplit('/').next().unwrap_or(package);
        let mut args: Vec<String> = vec!["go".into(), "build".into()];
        args.extend(options.go_build_flags.iter().map(|f| quote(f).into_owned()));
        args.extend(GO_BUILD_ARGS.iter().map(|a| a.to_string()));
        args.push("-o".into());
        args.push(format!("\"$OUTPUT\"/{}", quote(basename)));
        args.push(quote(package).into_owned());
        writeln!(out, "{}", args.join(" "))?;
    }
    writeln!(out)?;

    let image = options
        .tag
        .as_deref()
        .unwrap_or_else(|| entry.basename());
    let dockerfile = match entry.module_relative_path() {
        "" => DOCKERFILE_FILENAME.to_string(),
        dir => format!("{dir}/{DOCKERFILE_FILENAME}"),
    };
    writeln!(out, "IMAGE=${{IMAGE:-{}}}", quote(image))?;
    writeln!(
        out,
        "docker build -f {} -t \"$IMAGE\" \"$OUTPUT\"",
        quote(&dockerfile)
    )?;
    Ok(())
}
