// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Build options and the optional `.dockerize.yaml` project file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::script::ScriptOptions;
use crate::{CONFIG_FILENAME, DEFAULT_BASE_IMAGE, Error, Result};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// Options controlling a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Base image of the generated Dockerfile.
    pub base_image: String,
    /// Environment entries merged with the entry unit's env directives.
    pub env: Vec<String>,
    /// Extra flags passed to `go build`.
    pub go_build_flags: Vec<String>,
    /// Image name and optional tag given to the image builder.
    pub tag: Option<String>,
    /// Only generate the Dockerfile; never compile or build.
    pub dry_run: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            env: Vec::new(),
            go_build_flags: Vec::new(),
            tag: None,
            dry_run: false,
        }
    }
}

impl BuildOptions {
    pub fn script_options(&self) -> ScriptOptions {
        ScriptOptions {
            tag: self.tag.clone(),
            go_build_flags: self.go_build_flags.clone(),
        }
    }
}

/// API version for project files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "dockerize/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// Project defaults from a `.dockerize.yaml` file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub api: ApiVersion,

    /// Base image override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// Additional environment entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,

    /// Additional `go build` flags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub go_build_flags: Vec<String>,

    /// Default image name and tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ProjectConfig {
    /// Parse a project file's contents. `path` is only used for errors.
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self> {
        let invalid = |error| Error::InvalidYaml {
            path: path.to_path_buf(),
            error,
        };

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(invalid)?;
        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(invalid)?;

        // Stage 2: Deserialize based on version
        match with_version.api {
            ApiVersion::V0 => serde_yaml::from_value(value).map_err(invalid),
        }
    }

    /// Load a project file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
            path: path.to_path_buf(),
            error,
        })?;

        let mut config = Self::from_yaml(&yaml, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Find the nearest project file in `start` or any parent directory.
    pub fn discover<P: AsRef<Path>>(start: P) -> Result<Option<Self>> {
        let start = start.as_ref();
        let mut current =
            dunce::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());

        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                tracing::debug!(path = ?candidate, "using project config");
                return Self::load(&candidate).map(Some);
            }
            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Layer this file's settings onto `options`. Lists accumulate,
    /// scalars override.
    pub fn apply(&self, options: &mut BuildOptions) {
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
    }
}
