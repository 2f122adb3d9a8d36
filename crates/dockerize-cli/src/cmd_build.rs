// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dockerize build` command.

use std::cell::RefCell;
use std::io::Write;
use std::path::Path;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use crate::BuildFlags;

#[cfg(test)]
#[path = "./cmd_build_test.rs"]
mod cmd_build_test;

/// Build a Docker image from Go packages
#[derive(Debug, Args)]
pub struct CmdBuild {
    #[clap(flatten)]
    flags: BuildFlags,

    /// Only generate the Dockerfile; do not compile or build the image
    #[clap(long)]
    dry_run: bool,

    /// Go packages to include; the first one is the entrypoint
    #[clap(required = true, value_name = "PACKAGE")]
    packages: Vec<String>,
}

impl CmdBuild {
    pub fn run(&mut self) -> Result<i32> {
        let options = self.flags.build_options(self.dry_run)?;
        let loader = crate::unit_loader()?;
        let plan = dockerize::plan(&self.packages, &loader, &options)?;

        println!("{}", "Generated Dockerfile:".bold());
        for line in plan.descriptor.render().lines() {
            println!("\t{line}");
        }

        if options.dry_run {
            return Ok(0);
        }

        let cwd = std::env::current_dir().into_diagnostic()?;
        let progress = Progress::new(std::io::stdout());
        let compiler = progress.wrap(dockerize::GoCompiler::new(
            cwd,
            options.go_build_flags.clone(),
        ));
        let builder = progress.wrap(dockerize::DockerBuilder::default());
        dockerize::build(&plan, &options, &compiler, &builder)?;

        let image = options.tag.as_deref().unwrap_or("<untagged>");
        println!("{} {}", "Built image".green(), image.cyan());
        Ok(0)
    }
}

/// Announces each build step on `out` before running it.
struct Progress<W> {
    out: RefCell<W>,
}

impl<W: Write> Progress<W> {
    fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    fn wrap<T>(&self, inner: T) -> Reporting<'_, W, T> {
        Reporting {
            progress: self,
            inner,
        }
    }

    fn report(&self, message: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out.borrow_mut(), "{message}") {
            tracing::debug!(%err, "failed to report progress");
        }
    }
}

struct Reporting<'a, W, T> {
    progress: &'a Progress<W>,
    inner: T,
}

impl<W: Write, C: dockerize::Compiler> dockerize::Compiler for Reporting<'_, W, C> {
    fn compile(&self, unit: &dockerize::Unit, output: &Path) -> dockerize::Result<()> {
        self.progress
            .report(format_args!("Building Go binary {}...", unit.basename()));
        self.inner.compile(unit, output)
    }
}

impl<W: Write, B: dockerize::ImageBuilder> dockerize::ImageBuilder for Reporting<'_, W, B> {
    fn build_image(
        &self,
        context: &Path,
        dockerfile: &Path,
        tag: Option<&str>,
    ) -> dockerize::Result<()> {
        self.progress.report(format_args!("Building Docker image..."));
        self.inner.build_image(context, dockerfile, tag)
    }
}
