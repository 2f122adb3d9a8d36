// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Directive extraction from the source files of a unit.

use std::path::Path;

use crate::directive::{Directive, Location, parse_comment};
use crate::source::{CommentKind, extract_comments};
use crate::unit::Unit;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./parser_test.rs"]
mod parser_test;

/// A unit together with the directives found in its sources.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub unit: Unit,
    pub directives: Vec<Directive>,
}

impl ParsedUnit {
    /// Read and parse all source files of `unit`.
    pub fn parse(unit: Unit) -> Result<Self> {
        let directives = parse_unit(&unit)?;
        Ok(Self { unit, directives })
    }
}

/// Parse the directives of every file in the unit, in file order then
/// line order.
pub fn parse_unit(unit: &Unit) -> Result<Vec<Directive>> {
    let mut directives = Vec::new();
    for path in &unit.files {
        let source = std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
            path: path.clone(),
            error,
        })?;
        directives.extend(parse_source(path, &source)?);
    }

    tracing::debug!(
        package = %unit.import_path,
        count = directives.len(),
        "parsed directives"
    );
    Ok(directives)
}

/// Parse the directives in one file's text.
///
/// The first malformed directive aborts parsing of the whole file.
pub fn parse_source(path: &Path, source: &str) -> Result<Vec<Directive>> {
    extract_comments(source)
        .into_iter()
        .filter(|comment| comment.kind == CommentKind::Line)
        .filter_map(|comment| {
            let location = Location {
                path: path.to_path_buf(),
                line: comment.line,
            };
            parse_comment(&comment.text, location)
        })
        .collect()
}
