// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::directive::DirectiveKind;

fn write_unit(dir: &Path, files: &[(&str, &str)]) -> Unit {
    let mut paths = Vec::new();
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("Failed to write source file");
        paths.push(path);
    }
    Unit {
        name: "./cmd/app".to_string(),
        import_path: "example.com/cmd/app".to_string(),
        dir: dir.to_path_buf(),
        files: paths,
        module_path: Some("example.com".to_string()),
    }
}

#[rstest]
fn test_parse_unit_orders_by_file_then_line() {
    let tmp = TempDir::new().unwrap();
    let unit = write_unit(
        tmp.path(),
        &[
            (
                "main.go",
                "package main\n\n//docker:expose 80\n//docker:env A=1\n\nfunc main() {}\n",
            ),
            ("util.go", "package main\n//docker:install curl\n"),
        ],
    );

    let directives = parse_unit(&unit).expect("Should parse unit");
    let summary: Vec<_> = directives
        .iter()
        .map(|d| (d.kind, d.payload.as_str(), d.location.line))
        .collect();
    assert_eq!(
        summary,
        vec![
            (DirectiveKind::Expose, "80", 3),
            (DirectiveKind::Env, "A=1", 4),
            (DirectiveKind::Install, "curl", 2),
        ]
    );
    assert_eq!(directives[2].location.path, tmp.path().join("util.go"));
}

#[rstest]
fn test_parse_source_ignores_block_and_string_content() {
    let source = r#"package main

/*
//docker:env HIDDEN=1
*/
var s = "//docker:env ALSO_HIDDEN=1"

//docker:run echo "hi" // not a comment here
"#;
    let directives = parse_source(Path::new("main.go"), source).unwrap();
    assert_eq!(directives.len(), 1);
    assert_eq!(directives[0].kind, DirectiveKind::Run);
    assert_eq!(directives[0].payload, r#"echo "hi" // not a comment here"#);
}

#[rstest]
fn test_invalid_directive_aborts() {
    let source = "package main\n//docker:env A=1\n//docker:bogus foo\n//docker:env B=2\n";
    let result = parse_source(Path::new("main.go"), source);

    match result {
        Err(Error::DirectiveSyntax { location, text, .. }) => {
            assert_eq!(location.line, 3);
            assert_eq!(text, "//docker:bogus foo");
        }
        other => panic!("Expected DirectiveSyntax, got: {:?}", other),
    }
}

#[rstest]
fn test_missing_file_is_unit_load_error() {
    let tmp = TempDir::new().unwrap();
    let mut unit = write_unit(tmp.path(), &[("main.go", "package main\n")]);
    unit.files.push(tmp.path().join("missing.go"));

    let err = parse_unit(&unit).unwrap_err();
    assert!(matches!(err, Error::ReadFailed { .. }));
    assert!(err.is_unit_load_error());
}

#[rstest]
fn test_syntax_error_is_not_unit_load_error() {
    let tmp = TempDir::new().unwrap();
    let unit = write_unit(tmp.path(), &[("main.go", "//docker:install\n")]);

    let err = ParsedUnit::parse(unit).unwrap_err();
    assert!(matches!(err, Error::DirectiveSyntax { .. }));
    assert!(!err.is_unit_load_error());
}
