// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Comment extraction from Go source text.

#[cfg(test)]
#[path = "./source_test.rs"]
mod source_test;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...` up to the end of the line.
    Line,
    /// `/* ... */`, possibly spanning lines.
    Block,
}

/// A comment found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    /// Comment text including its markers.
    pub text: String,
    /// 1-based line the comment starts on.
    pub line: usize,
}

/// Extract every comment from Go source, in order of appearance.
///
/// String, raw string and rune literals are skipped so that comment
/// markers inside them are not mistaken for comments. Unterminated
/// literals and block comments run to the end of the input.
pub fn extract_comments(source: &str) -> Vec<Comment> {
    let bytes = source.as_bytes();
    let mut comments = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                line += 1;
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
                let text = source[i..end].trim_end_matches('\r');
                comments.push(Comment {
                    kind: CommentKind::Line,
                    text: text.to_string(),
                    line,
                });
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = source[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
                let text = &source[i..end];
                comments.push(Comment {
                    kind: CommentKind::Block,
                    text: text.to_string(),
                    line,
                });
                line += text.matches('\n').count();
                i = end;
            }
            b'`' => {
                let end = source[i + 1..].find('`').map_or(bytes.len(), |n| i + 1 + n + 1);
                line += source[i..end].matches('\n').count();
                i = end;
            }
            quote @ (b'"' | b'\'') => {
                i = skip_quoted(bytes, i + 1, quote);
            }
            _ => i += 1,
        }
    }

    comments
}

/// Skip an interpreted string or rune literal, returning the index just
/// past its closing quote. Newlines end the literal since Go does not
/// allow them inside one.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}
