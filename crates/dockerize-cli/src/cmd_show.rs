// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `dockerize show` command.

use clap::{Args, ValueEnum};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use crate::BuildFlags;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Yaml,
    Json,
}

/// Display the merged image configuration
#[derive(Debug, Args)]
pub struct CmdShow {
    #[clap(flatten)]
    flags: BuildFlags,

    /// Output format
    #[clap(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Go packages to include; the first one is the entrypoint
    #[clap(required = true, value_name = "PACKAGE")]
    packages: Vec<String>,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let options = self.flags.build_options(true)?;
        let loader = crate::unit_loader()?;
        let plan = dockerize::plan(&self.packages, &loader, &options)?;

        match self.format {
            Format::Table => self.show_table(&plan.config, &options.base_image),
            Format::Yaml => {
                let yaml = serde_yaml::to_string(&plan.config).into_diagnostic()?;
                print!("{yaml}");
            }
            Format::Json => {
                let json = serde_json::to_string_pretty(&plan.config).into_diagnostic()?;
                println!("{json}");
            }
        }

        Ok(0)
    }

    fn show_table(&self, config: &dockerize::AccumulatedConfig, base_image: &str) {
        println!("{} {}", "Base Image:".bold(), base_image.cyan());
        println!();

        println!("{}", "Packages:".bold());
        for (i, package) in config.packages.iter().enumerate() {
            let marker = if i == 0 { " [entrypoint]" } else { "" };
            println!("  {}. {}{}", i + 1, package.cyan(), marker.yellow());
        }

        print_list("Install:", config.install.iter());
        print_list("Repositories:", config.repositories.iter());
        print_list("Run:", config.run.iter());
        print_list("Environment:", config.env.iter());
        print_list("Expose:", config.expose.iter());

        if let Some(user) = &config.user {
            println!();
            println!("{} {}", "User:".bold(), user.green());
            for dir in &config.user_dirs {
                println!("  {}", dir.dimmed());
            }
        }
        if let Some(cmd) = &config.cmd {
            println!();
            println!("{} {}", "Cmd:".bold(), cmd.green());
        }

        if !config.ignored.is_empty() {
            println!();
            println!("{}", "Ignored Directives:".bold());
            for ignored in &config.ignored {
                println!(
                    "  {} {} {}",
                    ignored.kind.to_string().yellow(),
                    ignored.location.to_string().dimmed(),
                    format!("(declared in {})", ignored.package).dimmed()
                );
            }
        }
    }
}

fn print_list<'a>(title: &str, items: impl ExactSizeIterator<Item = &'a String>) {
    println!();
    println!("{}", title.bold());
    if items.len() == 0 {
        println!("  {}", "(none)".dimmed());
        return;
    }
    for item in items {
        println!("  {}", item.green());
    }
}
