// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! End to end build: load units, merge directives, compile and build.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use crate::config::BuildOptions;
use crate::descriptor::{self, Descriptor};
use crate::merge::{AccumulatedConfig, merge_units};
use crate::parser::ParsedUnit;
use crate::script::{self, ScriptOptions};
use crate::unit::{Unit, UnitLoader};
use crate::{
    BUILD_SCRIPT_FILENAME, CROSS_COMPILE_ENV, DOCKERFILE_FILENAME, Error, GO_BUILD_ARGS, Result,
};

#[cfg(test)]
#[path = "./pipeline_test.rs"]
mod pipeline_test;

/// Compiles a unit into a standalone binary.
pub trait Compiler {
    fn compile(&self, unit: &Unit, output: &Path) -> Result<()>;
}

/// Builds an image from a Dockerfile and a build context.
pub trait ImageBuilder {
    fn build_image(&self, context: &Path, dockerfile: &Path, tag: Option<&str>) -> Result<()>;
}

/// Cross-compiles with `go build` for linux/amd64 without cgo.
#[derive(Debug, Clone)]
pub struct GoCompiler {
    go: PathBuf,
    working_dir: PathBuf,
    flags: Vec<String>,
}

impl GoCompiler {
    pub fn new<P: Into<PathBuf>>(working_dir: P, flags: Vec<String>) -> Self {
        Self {
            go: PathBuf::from("go"),
            working_dir: working_dir.into(),
            flags,
        }
    }
}

impl Compiler for GoCompiler {
    fn compile(&self, unit: &Unit, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.go);
        cmd.arg("build")
            .args(&self.flags)
            .args(GO_BUILD_ARGS)
            .arg("-o")
            .arg(output)
            .arg(&unit.import_path)
            .current_dir(&self.working_dir)
            .envs(CROSS_COMPILE_ENV);

        tracing::debug!(?cmd, "compiling");
        let status = cmd.status().map_err(|error| Error::CommandFailed {
            program: self.go.display().to_string(),
            error,
        })?;
        if !status.success() {
            return Err(Error::CompileFailed {
                unit: unit.import_path.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Builds images with `docker build`.
#[derive(Debug, Clone)]
pub struct DockerBuilder {
    docker: PathBuf,
}

impl Default for DockerBuilder {
    fn default() -> Self {
        Self {
            docker: PathBuf::from("docker"),
        }
    }
}

impl ImageBuilder for DockerBuilder {
    fn build_image(&self, context: &Path, dockerfile: &Path, tag: Option<&str>) -> Result<()> {
        let mut cmd = Command::new(&self.docker);
        cmd.arg("build");
        if let Some(tag) = tag {
            cmd.args(["-t", tag]);
        }
        cmd.arg("-f").arg(dockerfile).arg(".").current_dir(context);

        tracing::debug!(?cmd, "building image");
        let status = cmd.status().map_err(|error| Error::CommandFailed {
            program: self.docker.display().to_string(),
            error,
        })?;
        if !status.success() {
            return Err(Error::ImageBuildFailed { status });
        }
        Ok(())
    }
}

/// Everything known about a build before anything is compiled.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Units in the order given; the first is the entry unit.
    pub units: Vec<ParsedUnit>,
    pub config: AccumulatedConfig,
    pub descriptor: Descriptor,
}

impl Plan {
    /// The entry unit. Plans always hold at least one unit.
    pub fn entry(&self) -> &Unit {
        &self.units[0].unit
    }

    pub fn build_script(&self, options: &ScriptOptions) -> String {
        script::synthesize(&self.config, self.entry(), options)
    }
}

/// Load, parse and merge the named units and synthesize their descriptor.
///
/// Nothing is written to disk.
pub fn plan<S: AsRef<str>>(
    names: &[S],
    loader: &dyn UnitLoader,
    options: &BuildOptions,
) -> Result<Plan> {
    if names.is_empty() {
        return Err(Error::NoUnits);
    }

    let mut units = Vec::with_capacity(names.len());
    for name in names {
        let unit = loader.load(name.as_ref())?;
        units.push(ParsedUnit::parse(unit)?);
    }

    let config = merge_units(&units, options.env.as_slice())?;
    let entry_basename = units[0].unit.basename();
    let descriptor = descriptor::synthesize(&config, &options.base_image, entry_basename);

    Ok(Plan {
        units,
        config,
        descriptor,
    })
}

/// Compile every unit and build the image in an ephemeral build context.
///
/// Does nothing under `dry_run`. The context directory is removed on
/// every exit path.
pub fn build(
    plan: &Plan,
    options: &BuildOptions,
    compiler: &dyn Compiler,
    builder: &dyn ImageBuilder,
) -> Result<()> {
    if options.dry_run {
        tracing::info!("dry run, skipping compile and image build");
        return Ok(());
    }

    let context = tempfile::Builder::new().prefix("dockerize").tempdir()?;
    let dockerfile = context.path().join(DOCKERFILE_FILENAME);
    std::fs::write(&dockerfile, plan.descriptor.render()).map_err(|error| {
        Error::WriteFailed {
            path: dockerfile.clone(),
            error,
        }
    })?;

    for parsed in &plan.units {
        let unit = &parsed.unit;
        tracing::debug!(unit = %unit.import_path, "compiling");
        compiler.compile(unit, &context.path().join(unit.basename()))?;
    }

    tracing::debug!(context = ?context.path(), "building image");
    builder.build_image(context.path(), &dockerfile, options.tag.as_deref())
}

/// Paths of written artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub dockerfile: PathBuf,
    pub build_script: PathBuf,
}

/// Write the Dockerfile and build script into `dir`.
///
/// Both files are staged in `dir` and only moved into place once both were
/// written, so a failed write leaves `dir` untouched. Moving into place is
/// two renames with the Dockerfile first; if the second rename fails the
/// new Dockerfile stays next to the previous build script.
pub fn write_artifacts(plan: &Plan, options: &ScriptOptions, dir: &Path) -> Result<Artifacts> {
    let dockerfile = stage(dir, plan.descriptor.render().as_bytes())?;
    let build_script = stage(dir, plan.build_script(options).as_bytes())?;
    set_mode(dockerfile.path(), 0o644)?;
    set_mode(build_script.path(), 0o755)?;

    let artifacts = Artifacts {
        dockerfile: dir.join(DOCKERFILE_FILENAME),
        build_script: dir.join(BUILD_SCRIPT_FILENAME),
    };
    persist(dockerfile, &artifacts.dockerfile)?;
    persist(build_script, &artifacts.build_script)?;

    tracing::info!(dir = ?dir, "wrote {DOCKERFILE_FILENAME} and {BUILD_SCRIPT_FILENAME}");
    Ok(artifacts)
}

fn stage(dir: &Path, content: &[u8]) -> Result<NamedTempFile> {
    let write_failed = |error| Error::WriteFailed {
        path: dir.to_path_buf(),
        error,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(write_failed)?;
    file.write_all(content).map_err(write_failed)?;
    Ok(file)
}

fn persist(file: NamedTempFile, path: &Path) -> Result<()> {
    file.persist(path).map_err(|e| Error::WriteFailed {
        path: path.to_path_buf(),
        error: e.error,
    })?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|error| {
        Error::WriteFailed {
            path: path.to_path_buf(),
            error,
        }
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
