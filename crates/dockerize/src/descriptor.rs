// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Image descriptor (Dockerfile) synthesis.
//!
//! Instructions are emitted in a fixed order: everything that rarely
//! changes (base image, repositories, packages, users) comes before
//! what changes per build (run commands, env, ports, command, binaries)
//! so that image builders can reuse cached layers.

use std::collections::BTreeSet;
use std::fmt;

use crate::merge::AccumulatedConfig;

#[cfg(test)]
#[path = "./descriptor_test.rs"]
mod descriptor_test;

/// Suffix marking a package that comes from the edge repositories.
pub const EDGE_MARKER: &str = "@edge";

/// Base images with this prefix get [`DNS_PACKAGE`] installed.
pub const DNS_DISTRIBUTION_PREFIX: &str = "alpine";

/// Alpine lacks the resolver support needed to reach other containers on a
/// user-defined Docker network unless this package is installed.
pub const DNS_PACKAGE: &str = "bind-tools";

/// Process supervisor used as the image entrypoint.
pub const SUPERVISOR: &str = "/sbin/tini";

/// Directory the compiled binaries are installed to.
pub const INSTALL_DIR: &str = "/usr/local/bin/";

const ALPINE_MIRROR: &str = "http://dl-cdn.alpinelinux.org/alpine";
const APK_REPOSITORIES: &str = "/etc/apk/repositories";

/// A single image build instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    From(String),
    Run(String),
    Env(Vec<String>),
    Expose(Vec<String>),
    User(String),
    Cmd(String),
    Entrypoint(Vec<String>),
    Add { source: String, destination: String },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From(image) => write!(f, "FROM {image}"),
            Self::Run(command) => write!(f, "RUN {command}"),
            Self::Env(vars) => write!(f, "ENV {}", vars.join(" ")),
            Self::Expose(ports) => write!(f, "EXPOSE {}", ports.join(" ")),
            Self::User(user) => write!(f, "USER {user}"),
            Self::Cmd(cmd) => write!(f, "CMD {cmd}"),
            Self::Entrypoint(args) => {
                let quoted: Vec<_> = args.iter().map(|a| format!("{a:?}")).collect();
                write!(f, "ENTRYPOINT [{}]", quoted.join(", "))
            }
            Self::Add {
                source,
                destination,
            } => write!(f, "ADD {source} {destination}"),
        }
    }
}

/// An ordered sequence of image build instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub instructions: Vec<Instruction>,
}

impl Descriptor {
    /// Render as Dockerfile text, one instruction per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for instruction in &self.instructions {
            out.push_str(&instruction.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Build the descriptor for a merged configuration.
///
/// `entry_basename` names the binary started by the entrypoint.
pub fn synthesize(config: &AccumulatedConfig, base_image: &str, entry_basename: &str) -> Descriptor {
    let mut instructions = vec![Instruction::From(base_image.to_string())];

    if config.install.iter().any(|p| p.ends_with(EDGE_MARKER)) {
        instructions.push(register_channel(&format!("{EDGE_MARKER} {ALPINE_MIRROR}/edge")));
    }
    for repository in &config.repositories {
        instructions.push(register_channel(&format!("{ALPINE_MIRROR}/{repository}")));
    }

    let mut install: BTreeSet<&str> = config.install.iter().map(String::as_str).collect();
    if base_image.starts_with(DNS_DISTRIBUTION_PREFIX) {
        install.insert(DNS_PACKAGE);
    }
    if !install.is_empty() {
        let packages: Vec<_> = install.into_iter().collect();
        instructions.push(Instruction::Run(format!(
            "apk add --no-cache {}",
            packages.join(" ")
        )));
    }

    if let Some(user) = &config.user {
        let mut commands = vec![format!(
            "addgroup -S {user} && adduser -S -G {user} -h /home/{user} {user}"
        )];
        for dir in &config.user_dirs {
            commands.push(format!("mkdir -p {dir} && chown -R {user}:{user} {dir}"));
        }
        instructions.push(Instruction::Run(commands.join(" && ")));
    }

    for command in &config.run {
        instructions.push(Instruction::Run(command.clone()));
    }

    if !config.env.is_empty() {
        instructions.push(Instruction::Env(config.env.iter().cloned().collect()));
    }
    if !config.expose.is_empty() {
        instructions.push(Instruction::Expose(config.expose.iter().cloned().collect()));
    }
    if let Some(user) = &config.user {
        instructions.push(Instruction::User(user.clone()));
    }
    if let Some(cmd) = &config.cmd {
        instructions.push(Instruction::Cmd(cmd.clone()));
    }

    instructions.push(Instruction::Entrypoint(vec![
        SUPERVISOR.to_string(),
        "--".to_string(),
        format!("{INSTALL_DIR}{entry_basename}"),
    ]));

    for package in &config.packages {
        instructions.push(Instruction::Add {
            source: package_basename(package).to_string(),
            destination: INSTALL_DIR.to_string(),
        });
    }

    Descriptor { instructions }
}

/// One instruction registering the main and community repositories of a
/// channel.
fn register_channel(channel: &str) -> Instruction {
    Instruction::Run(format!(
        "echo -e \"{channel}/main\\n\" >> {APK_REPOSITORIES} && \\\n    \
         echo -e \"{channel}/community\\n\" >> {APK_REPOSITORIES}"
    ))
}

fn package_basename(import_path: &str) -> &str {
    import_path.rsplit('/').next().unwrap_or(import_path)
}
