// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Build units (Go packages) and how they are located.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./unit_test.rs"]
mod unit_test;

/// A named, independently compilable package with its source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// The name as requested by the caller.
    pub name: String,
    /// Canonical import path.
    pub import_path: String,
    /// Directory holding the package sources.
    pub dir: PathBuf,
    /// Source files in build order.
    pub files: Vec<PathBuf>,
    /// Path of the module containing this package, if any.
    pub module_path: Option<String>,
}

impl Unit {
    /// Last element of the import path, used to name the compiled binary.
    pub fn basename(&self) -> &str {
        self.import_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.import_path)
    }

    /// Import path relative to the module root.
    ///
    /// Outside of a module the whole import path is returned, which is
    /// also the package's location relative to `$GOPATH/src`.
    pub fn module_relative_path(&self) -> &str {
        match &self.module_path {
            Some(module) => match self.import_path.strip_prefix(module.as_str()) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                    rest.trim_start_matches('/')
                }
                _ => &self.import_path,
            },
            None => &self.import_path,
        }
    }

    /// Number of directories between the package and its root.
    pub fn depth(&self) -> usize {
        self.module_relative_path()
            .split('/')
            .filter(|s| !s.is_empty())
            .count()
    }
}

/// Locates units by name.
pub trait UnitLoader {
    fn load(&self, name: &str) -> Result<Unit>;
}

/// Resolves units with `go list -json`.
#[derive(Debug, Clone)]
pub struct GoListLoader {
    go: PathBuf,
    working_dir: PathBuf,
}

impl GoListLoader {
    pub fn new<P: Into<PathBuf>>(working_dir: P) -> Self {
        Self {
            go: PathBuf::from("go"),
            working_dir: working_dir.into(),
        }
    }

    /// Use a specific `go` binary instead of the one on `PATH`.
    pub fn with_go<P: Into<PathBuf>>(mut self, go: P) -> Self {
        self.go = go.into();
        self
    }
}

impl UnitLoader for GoListLoader {
    fn load(&self, name: &str) -> Result<Unit> {
        tracing::debug!(package = name, dir = ?self.working_dir, "go list");
        let output = Command::new(&self.go)
            .args(["list", "-json", name])
            .current_dir(&self.working_dir)
            .output()
            .map_err(|error| Error::CommandFailed {
                program: self.go.display().to_string(),
                error,
            })?;

        if !output.status.success() {
            return Err(Error::UnitResolution {
                name: name.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        unit_from_go_list(name, &output.stdout)
    }
}

/// The subset of `go list -json` output that we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoPackage {
    #[serde(default)]
    dir: PathBuf,
    import_path: String,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    module: Option<GoModule>,
    #[serde(default)]
    error: Option<GoPackageError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoModule {
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoPackageError {
    err: String,
}

/// Build a unit from the raw output of `go list -json <name>`.
pub(crate) fn unit_from_go_list(name: &str, json: &[u8]) -> Result<Unit> {
    let resolution_error = |reason: String| Error::UnitResolution {
        name: name.to_string(),
        reason,
    };

    let packages = serde_json::Deserializer::from_slice(json)
        .into_iter::<GoPackage>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| resolution_error(format!("unreadable go list output: {e}")))?;

    let package = match <[GoPackage; 1]>::try_from(packages) {
        Ok([package]) => package,
        Err(packages) if packages.is_empty() => {
            return Err(resolution_error("no package found".to_string()));
        }
        Err(packages) => {
            return Err(resolution_error(format!(
                "matches {} packages, expected exactly one",
                packages.len()
            )));
        }
    };

    if let Some(error) = package.error {
        return Err(resolution_error(error.err));
    }
    if package.go_files.is_empty() {
        return Err(resolution_error("no Go files".to_string()));
    }

    let dir = resolve_dir(&package.dir);
    let files = package.go_files.iter().map(|f| dir.join(f)).collect();

    Ok(Unit {
        name: name.to_string(),
        import_path: package.import_path,
        dir,
        files,
        module_path: package.module.map(|m| m.path),
    })
}

fn resolve_dir(dir: &Path) -> PathBuf {
    dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}
