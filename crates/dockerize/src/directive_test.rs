// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use strum::IntoEnumIterator;

use super::*;

fn loc(line: usize) -> Location {
    Location {
        path: PathBuf::from("/src/main.go"),
        line,
    }
}

#[rstest]
#[case("//docker:env FOO=1 BAR=2", DirectiveKind::Env, "FOO=1 BAR=2")]
#[case("//docker:expose 8080", DirectiveKind::Expose, "8080")]
#[case("//docker:install curl git", DirectiveKind::Install, "curl git")]
#[case("//docker:repository v3.9", DirectiveKind::Repository, "v3.9")]
#[case("//docker:run echo   hi && true", DirectiveKind::Run, "echo   hi && true")]
#[case(r#"//docker:cmd ["serve", "--port", "80"]"#, DirectiveKind::Cmd, r#"["serve", "--port", "80"]"#)]
#[case("//docker:user app /data /cache", DirectiveKind::User, "app /data /cache")]
#[case("//docker:install\t  curl  ", DirectiveKind::Install, "curl")]
fn test_parse_valid_directives(
    #[case] text: &str,
    #[case] kind: DirectiveKind,
    #[case] payload: &str,
) {
    let directive = parse_comment(text, loc(3))
        .expect("Should be recognized as a directive")
        .expect("Should parse");
    assert_eq!(directive.kind, kind);
    assert_eq!(directive.payload, payload);
    assert_eq!(directive.location, loc(3));
}

#[rstest]
#[case("// regular comment")]
#[case("// docker:env FOO=1")]
#[case("//  //docker:env FOO=1")]
#[case("//Docker:env FOO=1")]
#[case("/* //docker:env FOO=1 */")]
fn test_non_directives_are_skipped(#[case] text: &str) {
    assert!(parse_comment(text, loc(1)).is_none());
}

#[rstest]
#[case("//docker:bogus foo", "unknown directive 'bogus'")]
#[case("//docker:Env FOO=1", "unknown directive 'Env'")]
#[case("//docker:env", "missing value")]
#[case("//docker:env   ", "missing value")]
#[case("//docker:", "missing value")]
fn test_invalid_directives_are_errors(#[case] text: &str, #[case] expected_reason: &str) {
    let result = parse_comment(text, loc(7)).expect("Prefix should be recognized");
    match result {
        Err(Error::DirectiveSyntax {
            location,
            text: bad_text,
            reason,
        }) => {
            assert_eq!(location, loc(7));
            assert_eq!(bad_text, text);
            assert_eq!(reason, expected_reason);
        }
        other => panic!("Expected DirectiveSyntax, got: {:?}", other),
    }
}

#[rstest]
fn test_syntax_error_message_names_line() {
    let err = parse_comment("//docker:bogus foo", loc(12))
        .unwrap()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("/src/main.go:12:"), "{message}");
    assert!(message.contains("//docker:bogus foo"), "{message}");
}

#[rstest]
fn test_placement_partition() {
    let entry_only: Vec<_> = DirectiveKind::iter()
        .filter(|k| k.placement() == Placement::EntryUnit)
        .collect();
    assert_eq!(
        entry_only,
        vec![
            DirectiveKind::Env,
            DirectiveKind::Expose,
            DirectiveKind::Cmd,
            DirectiveKind::User
        ]
    );
    assert_eq!(DirectiveKind::iter().count(), 7);
}

#[rstest]
fn test_tokens_split_on_whitespace() {
    let directive = parse_comment("//docker:user app  /data\t/cache", loc(1))
        .unwrap()
        .unwrap();
    assert_eq!(
        directive.tokens().collect::<Vec<_>>(),
        vec!["app", "/data", "/cache"]
    );
    assert!(!directive.kind.keeps_full_payload());
    assert_eq!(directive.values(), vec!["app", "/data", "/cache"]);
}

#[rstest]
#[case("//docker:run apk add  --no-cache git", "apk add  --no-cache git")]
#[case("//docker:cmd [\"serve\",  \"-v\"]", "[\"serve\",  \"-v\"]")]
fn test_full_payload_kinds_keep_one_value(#[case] text: &str, #[case] expected: &str) {
    let directive = parse_comment(text, loc(1)).unwrap().unwrap();
    assert!(directive.kind.keeps_full_payload());
    assert_eq!(directive.values(), vec![expected]);
}
