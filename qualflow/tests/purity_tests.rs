//! Integration tests: purity labels, configuration and report files

mod common;
use common::*;

use pretty_assertions::assert_eq;
use qualflow::checks::purity::PurityLabel;
use qualflow::program::{Declaration, Program, Routine};
use qualflow::{run_json_str, CheckSession, QualflowConfig, QualflowError};
use std::io::Write;
use test_log::test;

fn shapes() -> Program {
    let mut declaration = Declaration::new("Shapes");
    declaration.routines.push(pure_add());
    declaration.routines.push(Routine::new("external"));
    Program {
        declarations: vec![declaration],
    }
}

fn label(config: QualflowConfig, signature: &str) -> PurityLabel {
    let outcome = qualflow::check_program(&shapes(), config);
    *outcome.purity_report.get("Shapes", signature).unwrap()
}

#[test]
fn test_pure_body_and_bodiless_default() {
    assert_eq!(label(QualflowConfig::default(), "add(int,int)"), PurityLabel::Pure);
    assert_eq!(label(QualflowConfig::default(), "external()"), PurityLabel::Impure);
}

#[test]
fn test_assume_pure_flag_labels_bodiless_routine() {
    let config = QualflowConfig::default().with_flags(["assumePure"]).unwrap();
    assert_eq!(label(config, "external()"), PurityLabel::Pure);

    let config = QualflowConfig::default()
        .with_flags(["assumeDeterministic"])
        .unwrap();
    assert_eq!(label(config, "external()"), PurityLabel::Deterministic);
}

#[test]
fn test_unknown_flag_is_an_error() {
    let err = QualflowConfig::default()
        .with_flags(["assumeEverything"])
        .unwrap_err();
    assert!(matches!(err, QualflowError::UnknownOption(ref name) if name == "assumeEverything"));
}

#[test]
fn test_config_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[purity]
assume_side_effect_free = true
report = "purity.json"

[purity.callees]
"Math.abs(int)" = "pure"

[engine]
max_block_visits = 500
"#
    )
    .unwrap();

    let config = QualflowConfig::from_file(file.path()).unwrap();
    assert!(config.purity.assumes_side_effect_free());
    assert!(!config.purity.assumes_deterministic());
    assert_eq!(config.engine.max_block_visits, 500);
    assert_eq!(config.purity.callees["Math.abs(int)"], PurityLabel::Pure);
    assert_eq!(label(config, "external()"), PurityLabel::SideEffectFree);
}

#[test]
fn test_misspelled_config_key_is_rejected() {
    let err = QualflowConfig::from_toml_str("[purity]\nassume_purity = true\n").unwrap_err();
    assert!(matches!(err, QualflowError::Config(_)));
}

#[test]
fn test_reports_written_once_and_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let config = QualflowConfig::default();

    for _ in 0..2 {
        let mut session = CheckSession::new(config.clone());
        session.check_program(&shapes());
        session.finish().write_reports(dir.path(), &config).unwrap();
    }

    let purity = std::fs::read_to_string(dir.path().join("cf_output.json")).unwrap();
    insta::assert_snapshot!(purity.trim_end(), @r#"
    {
      "Shapes": {
        "add(int,int)": "pure",
        "external()": "impure"
      }
    }
    "#);
    let constants = std::fs::read_to_string(dir.path().join("constants_output.json")).unwrap();
    assert_eq!(constants, "{}\n");
}

#[test]
fn test_run_json_str_rejects_malformed_graph() {
    let json = r#"{ "declarations": [{
        "name": "Bad",
        "routines": [{
            "name": "f",
            "body": { "blocks": [{ "id": 0 }], "edges": [{ "from": 0, "to": 7 }] }
        }]
    }] }"#;
    let err = run_json_str(json, QualflowConfig::default()).unwrap_err();
    assert!(matches!(err, QualflowError::Json(_)), "{:?}", err);
    assert!(err.to_string().contains("unknown block b7"), "{}", err);
}
