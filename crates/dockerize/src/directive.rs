// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Directive types and parsing for `//docker:` source comments.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use crate::{DIRECTIVE_PREFIX, Error, Result};

#[cfg(test)]
#[path = "./directive_test.rs"]
mod directive_test;

/// The kind of a directive, taken from the word following the prefix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Env,
    Expose,
    Install,
    Repository,
    Run,
    Cmd,
    User,
}

/// Where a directive kind is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Only when declared in the entry unit; ignored elsewhere.
    EntryUnit,
    /// Accumulated from every unit.
    AnyUnit,
}

impl DirectiveKind {
    pub fn placement(self) -> Placement {
        match self {
            Self::Env | Self::Expose | Self::Cmd | Self::User => Placement::EntryUnit,
            Self::Install | Self::Repository | Self::Run => Placement::AnyUnit,
        }
    }

    /// Whether the payload is one opaque string rather than a list of tokens.
    pub fn keeps_full_payload(self) -> bool {
        matches!(self, Self::Run | Self::Cmd)
    }
}

/// A position in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: PathBuf,
    /// 1-based line number.
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// A typed instruction found in a source comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Everything after the kind, with surrounding whitespace removed.
    pub payload: String,
    pub location: Location,
}

impl Directive {
    /// Whitespace separated tokens of the payload.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.payload.split_whitespace()
    }

    /// The values this directive contributes: the whole payload for kinds
    /// that keep it intact, otherwise its tokens.
    pub fn values(&self) -> Vec<String> {
        if self.kind.keeps_full_payload() {
            vec![self.payload.clone()]
        } else {
            self.tokens().map(String::from).collect()
        }
    }
}

/// Parse a single comment into a directive.
///
/// `text` is the full comment including its `//` marker. Returns `None`
/// when the comment is not a directive at all, and an error when it
/// carries the prefix but cannot be understood.
pub fn parse_comment(text: &str, location: Location) -> Option<Result<Directive>> {
    let rest = text.strip_prefix(DIRECTIVE_PREFIX)?;
    Some(parse_directive_body(text, rest, location))
}

fn parse_directive_body(text: &str, rest: &str, location: Location) -> Result<Directive> {
    let syntax_error = |location: Location, reason: String| Error::DirectiveSyntax {
        location,
        text: text.to_string(),
        reason,
    };

    let Some((kind, payload)) = rest.split_once(char::is_whitespace) else {
        return Err(syntax_error(location, "missing value".to_string()));
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(syntax_error(location, "missing value".to_string()));
    }

    let kind: DirectiveKind = kind
        .parse()
        .map_err(|_| syntax_error(location.clone(), format!("unknown directive '{kind}'")))?;

    Ok(Directive {
        kind,
        payload: payload.to_string(),
        location,
    })
}
