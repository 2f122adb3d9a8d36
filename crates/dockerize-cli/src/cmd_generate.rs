// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dockerize generate` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;

use crate::BuildFlags;

/// Write a Dockerfile and build.sh for Go packages
#[derive(Debug, Args)]
pub struct CmdGenerate {
    #[clap(flatten)]
    flags: BuildFlags,

    /// Directory to write into [default: the first package's directory]
    #[clap(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print the generated files instead of writing them
    #[clap(long)]
    dry_run: bool,

    /// Go packages to include; the first one is the entrypoint
    #[clap(required = true, value_name = "PACKAGE")]
    packages: Vec<String>,
}

impl CmdGenerate {
    pub fn run(&mut self) -> Result<i32> {
        let options = self.flags.build_options(self.dry_run)?;
        let loader = crate::unit_loader()?;
        let plan = dockerize::plan(&self.packages, &loader, &options)?;
        let script_options = options.script_options();

        if options.dry_run {
            println!("{}", format!("# {}", dockerize::DOCKERFILE_FILENAME).dimmed());
            print!("{}", plan.descriptor);
            println!();
            println!(
                "{}",
                format!("# {}", dockerize::BUILD_SCRIPT_FILENAME).dimmed()
            );
            print!("{}", plan.build_script(&script_options));
            return Ok(0);
        }

        let dir = self
            .output
            .clone()
            .unwrap_or_else(|| plan.entry().dir.clone());
        if !dir.is_dir() {
            return Err(miette::miette!(
                "Output directory does not exist: {}",
                dir.display()
            ));
        }
        let artifacts = dockerize::write_artifacts(&plan, &script_options, &dir)?;

        println!("Wrote {}", artifacts.dockerfile.display().to_string().cyan());
        println!("Wrote {}", artifacts.build_script.display().to_string().cyan());
        Ok(0)
    }
}
