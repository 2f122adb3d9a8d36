// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use rstest::rstest;

use super::*;
use crate::parser::parse_source;

fn make_unit(import_path: &str, source: &str) -> ParsedUnit {
    let unit = Unit {
        name: import_path.to_string(),
        import_path: import_path.to_string(),
        dir: PathBuf::from("/src").join(import_path),
        files: vec![PathBuf::from("/src").join(import_path).join("main.go")],
        module_path: None,
    };
    let directives = parse_source(&unit.files[0], source).expect("Test source should parse");
    ParsedUnit { unit, directives }
}

fn sorted(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[rstest]
fn test_merge_empty() {
    let no_env: &[&str] = &[];
    let config = merge_units(&[], no_env).unwrap();

    assert!(config.packages.is_empty());
    assert_eq!(config.install, sorted(&["ca-certificates", "mailcap", "tini"]));
    assert!(config.env.is_empty());
    assert!(config.user.is_none());
    assert!(config.cmd.is_none());
}

#[rstest]
fn test_merge_entry_unit_directives() {
    let units = vec![make_unit(
        "app/frontend",
        "//docker:env FOO=1 BAR=2\n//docker:expose 8080 443\n//docker:cmd [\"serve\"]\n//docker:user app /data /cache\n",
    )];
    let config = merge_units(&units, &["DEFAULT=x"]).unwrap();

    assert_eq!(config.packages, vec!["app/frontend"]);
    assert_eq!(config.env, sorted(&["BAR=2", "DEFAULT=x", "FOO=1"]));
    assert_eq!(config.expose, sorted(&["443", "8080"]));
    assert_eq!(config.cmd.as_deref(), Some("[\"serve\"]"));
    assert_eq!(config.user.as_deref(), Some("app"));
    assert_eq!(config.user_dirs, vec!["/data", "/cache"]);
    assert!(config.ignored.is_empty());
}

#[rstest]
#[case::env("//docker:env FOO=1", DirectiveKind::Env)]
#[case::expose("//docker:expose 80", DirectiveKind::Expose)]
#[case::cmd("//docker:cmd [\"x\"]", DirectiveKind::Cmd)]
#[case::user("//docker:user app", DirectiveKind::User)]
fn test_restricted_directives_ignored_outside_entry_unit(
    #[case] source: &str,
    #[case] kind: DirectiveKind,
) {
    let units = vec![make_unit("app/main", ""), make_unit("app/worker", source)];
    let no_env: &[&str] = &[];
    let config = merge_units(&units, no_env).expect("Placement violations are not fatal");

    let baseline = merge_units(&[make_unit("app/main", ""), make_unit("app/worker", "")], no_env)
        .unwrap();
    assert_eq!(config.env, baseline.env);
    assert_eq!(config.expose, baseline.expose);
    assert_eq!(config.cmd, baseline.cmd);
    assert_eq!(config.user, baseline.user);
    assert_eq!(config.user_dirs, baseline.user_dirs);

    assert_eq!(config.ignored.len(), 1);
    assert_eq!(config.ignored[0].package, "app/worker");
    assert_eq!(config.ignored[0].kind, kind);
    assert_eq!(config.ignored[0].location.line, 1);
}

#[rstest]
fn test_accumulating_directives_from_every_unit() {
    let units = vec![
        make_unit(
            "app/main",
            "//docker:install curl tini\n//docker:repository v3.9\n//docker:run echo one\n",
        ),
        make_unit(
            "app/worker",
            "//docker:install git curl\n//docker:repository edge v3.9\n//docker:run echo two\n//docker:run echo one\n",
        ),
    ];
    let no_env: &[&str] = &[];
    let config = merge_units(&units, no_env).unwrap();

    assert_eq!(
        config.install,
        sorted(&["ca-certificates", "curl", "git", "mailcap", "tini"])
    );
    assert_eq!(config.repositories, vec!["v3.9", "edge", "v3.9"]);
    assert_eq!(config.run, vec!["echo one", "echo two", "echo one"]);
    assert_eq!(config.packages, vec!["app/main", "app/worker"]);
}

#[rstest]
fn test_duplicate_packages_are_kept() {
    let units = vec![make_unit("app/main", ""), make_unit("app/main", "")];
    let no_env: &[&str] = &[];
    let config = merge_units(&units, no_env).unwrap();
    assert_eq!(config.packages, vec!["app/main", "app/main"]);
}

#[rstest]
#[case::cmd("//docker:cmd [\"a\"]\n//docker:cmd [\"b\"]\n", DirectiveKind::Cmd, "[\"a\"]")]
#[case::user("//docker:user app /data\n//docker:user other\n", DirectiveKind::User, "app")]
fn test_write_once_conflicts(
    #[case] source: &str,
    #[case] expected_kind: DirectiveKind,
    #[case] expected_previous: &str,
) {
    let units = vec![make_unit("app/main", source)];
    let no_env: &[&str] = &[];

    match merge_units(&units, no_env) {
        Err(Error::Conflict {
            kind,
            location,
            previous,
        }) => {
            assert_eq!(kind, expected_kind);
            assert_eq!(location.line, 2);
            assert_eq!(previous, expected_previous);
        }
        other => panic!("Expected Conflict, got: {:?}", other),
    }
}

#[rstest]
fn test_conflict_message_names_kind() {
    let units = vec![make_unit("app/main", "//docker:cmd a\n//docker:cmd b\n")];
    let no_env: &[&str] = &[];
    let err = merge_units(&units, no_env).unwrap_err();
    assert!(err.to_string().contains("cmd set twice"), "{err}");
}

#[rstest]
fn test_second_cmd_in_other_unit_is_not_a_conflict() {
    let units = vec![
        make_unit("app/main", "//docker:cmd a\n"),
        make_unit("app/worker", "//docker:cmd b\n"),
    ];
    let no_env: &[&str] = &[];
    let config = merge_units(&units, no_env).unwrap();
    assert_eq!(config.cmd.as_deref(), Some("a"));
    assert_eq!(config.ignored.len(), 1);
}

#[rstest]
fn test_merge_is_deterministic() {
    let build = || {
        vec![
            make_unit(
                "app/main",
                "//docker:env Z=1 A=2 Z=1\n//docker:expose 9000 80\n//docker:run b\n",
            ),
            make_unit("app/worker", "//docker:install zz aa\n//docker:run a\n//docker:env X=1\n"),
        ]
    };
    let first = merge_units(&build(), &["M=3"]).unwrap();
    let second = merge_units(&build(), &["M=3"]).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(
        first.env.iter().collect::<Vec<_>>(),
        vec!["A=2", "M=3", "Z=1"]
    );
}

#[rstest]
fn test_apply_uses_explicit_entry_flag() {
    let parsed = make_unit("app/main", "//docker:expose 80\n");
    let mut config = AccumulatedConfig::new(Vec::<String>::new());

    config
        .apply(&parsed.unit, &parsed.directives[0], false)
        .unwrap();
    assert!(config.expose.is_empty());

    config
        .apply(&parsed.unit, &parsed.directives[0], true)
        .unwrap();
    assert_eq!(config.expose, sorted(&["80"]));
    assert_eq!(
        config.ignored[0].location.path,
        Path::new("/src/app/main/main.go")
    );
}

#[rstest]
fn test_full_payload_kinds_are_not_tokenized() {
    let units = vec![make_unit(
        "app/frontend",
        "//docker:run echo  \"a  b\"\n//docker:cmd [\"serve\",  \"--port\", \"80\"]\n",
    )];
    let no_env: &[&str] = &[];
    let config = merge_units(&units, no_env).unwrap();

    assert_eq!(config.run, vec!["echo  \"a  b\""]);
    assert_eq!(config.cmd.as_deref(), Some("[\"serve\",  \"--port\", \"80\"]"));
}
