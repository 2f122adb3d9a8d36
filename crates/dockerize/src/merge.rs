// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Merging directives from an ordered list of units into one configuration.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::directive::{Directive, DirectiveKind, Location, Placement};
use crate::parser::ParsedUnit;
use crate::unit::Unit;
use crate::{BASELINE_PACKAGES, Error, Result};

#[cfg(test)]
#[path = "./merge_test.rs"]
mod merge_test;

/// The merged configuration of all units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccumulatedConfig {
    /// Import paths of every unit, in the order given.
    pub packages: Vec<String>,
    pub env: BTreeSet<String>,
    pub expose: BTreeSet<String>,
    pub install: BTreeSet<String>,
    /// Repository channels in order of first appearance.
    pub repositories: Vec<String>,
    /// Commands in order of first appearance.
    pub run: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_dirs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Directives dropped because they were declared outside the entry unit.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<IgnoredDirective>,
}

/// A directive that was valid but not honored because of where it was
/// declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoredDirective {
    pub package: String,
    pub kind: DirectiveKind,
    pub location: Location,
}

impl AccumulatedConfig {
    /// Create a configuration holding only the baseline packages and the
    /// given environment defaults.
    pub fn new<I, S>(env: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: Vec::new(),
            env: env.into_iter().map(Into::into).collect(),
            expose: BTreeSet::new(),
            install: BASELINE_PACKAGES.iter().map(|p| p.to_string()).collect(),
            repositories: Vec::new(),
            run: Vec::new(),
            user: None,
            user_dirs: Vec::new(),
            cmd: None,
            ignored: Vec::new(),
        }
    }

    /// Fold one directive of `unit` into the configuration.
    ///
    /// Directives restricted to the entry unit are recorded as ignored
    /// when `is_entry_unit` is false.
    pub fn apply(&mut self, unit: &Unit, directive: &Directive, is_entry_unit: bool) -> Result<()> {
        if directive.kind.placement() == Placement::EntryUnit && !is_entry_unit {
            tracing::warn!(
                "{}: ignoring {} directive since {} is not the first package",
                directive.location,
                directive.kind,
                unit.name
            );
            self.ignored.push(IgnoredDirective {
                package: unit.import_path.clone(),
                kind: directive.kind,
                location: directive.location.clone(),
            });
            return Ok(());
        }

        let mut values = directive.values().into_iter();
        match directive.kind {
            DirectiveKind::Env => self.env.extend(values),
            DirectiveKind::Expose => self.expose.extend(values),
            DirectiveKind::Install => self.install.extend(values),
            DirectiveKind::Repository => self.repositories.extend(values),
            DirectiveKind::Run => self.run.extend(values),
            DirectiveKind::Cmd => {
                set_once(&mut self.cmd, directive, values.collect::<Vec<_>>().concat())?;
            }
            DirectiveKind::User => {
                let user = values.next().unwrap_or_default();
                set_once(&mut self.user, directive, user)?;
                self.user_dirs.extend(values);
            }
        }
        Ok(())
    }
}

fn set_once(slot: &mut Option<String>, directive: &Directive, value: String) -> Result<()> {
    if let Some(previous) = slot {
        return Err(Error::Conflict {
            kind: directive.kind,
            location: directive.location.clone(),
            previous: previous.clone(),
        });
    }
    *slot = Some(value);
    Ok(())
}

/// Merge the directives of all units, in order.
///
/// The first unit is the entry unit. Either every directive is merged or
/// the first conflict is returned.
pub fn merge_units<S: AsRef<str>>(units: &[ParsedUnit], default_env: &[S]) -> Result<AccumulatedConfig> {
    let mut config = AccumulatedConfig::new(default_env.iter().map(AsRef::as_ref));

    for (index, parsed) in units.iter().enumerate() {
        let is_entry_unit = index == 0;
        config.packages.push(parsed.unit.import_path.clone());
        for directive in &parsed.directives {
            config.apply(&parsed.unit, directive, is_entry_unit)?;
        }
    }

    Ok(config)
}
