// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! dockerize - build Docker images from Go packages

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

mod cmd_build;
mod cmd_generate;
mod cmd_show;

use cmd_build::CmdBuild;
use cmd_generate::CmdGenerate;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "dockerize",
    about = "Build Docker images from Go packages",
    version,
    long_about = "Compile Go packages and install them to /usr/local/bin in a Docker image.\n\
                  Image configuration comes from //docker: directives in the package sources;\n\
                  the first package is used as the entrypoint."
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Flags shared by every command that reads packages.
#[derive(Args, Clone, Debug, Default)]
pub struct BuildFlags {
    /// Base Docker image name [default: alpine:3.8]
    #[clap(long, env = "DOCKERIZE_BASE")]
    pub base: Option<String>,

    /// Additional environment variables for the Dockerfile
    #[clap(long = "env", value_name = "NAME=VALUE")]
    pub env: Vec<String>,

    /// Additional flags to pass to go build
    #[clap(long = "go-build-flags", value_name = "FLAG", allow_hyphen_values = true)]
    pub go_build_flags: Vec<String>,

    /// Output Docker image name and optionally a tag in the 'name:tag' format
    #[clap(long, short, env = "DOCKERIZE_TAG")]
    pub tag: Option<String>,

    /// Project config file [default: nearest .dockerize.yaml]
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl BuildFlags {
    /// Layer defaults, the project file and these flags into build options.
    pub fn build_options(&self, dry_run: bool) -> Result<dockerize::BuildOptions> {
        let mut options = dockerize::BuildOptions {
            dry_run,
            ..Default::default()
        };

        let project = match &self.config {
            Some(path) => Some(dockerize::ProjectConfig::load(path)?),
            None => {
                let cwd = std::env::current_dir().into_diagnostic()?;
                dockerize::ProjectConfig::discover(cwd)?
            }
        };
        if let Some(project) = project {
            tracing::info!(path = ?project.source_path, "loaded project config");
            project.apply(&mut options);
        }

        if let Some(base) = &self.base {
            options.base_image = base.clone();
        }
        options.env.extend(self.env.iter().cloned());
        options
            .go_build_flags
            .extend(self.go_build_flags.iter().cloned());
        if self.tag.is_some() {
            options.tag = self.tag.clone();
        }
        Ok(options)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build a Docker image from Go packages
    Build(CmdBuild),

    /// Write a Dockerfile and build script next to the first package
    Generate(CmdGenerate),

    /// Display the merged image configuration
    Show(CmdShow),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Build(mut cmd) => cmd.run(),
            Command::Generate(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
        }
    }
}

/// Resolve packages relative to the current directory.
pub fn unit_loader() -> Result<dockerize::GoListLoader> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    Ok(dockerize::GoListLoader::new(cwd))
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
