// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
fn test_parse_sections_and_values() {
    let doc = CfgDocument::parse(
        "[SCRIPTS]\nsample.py = sample\n\n[sample]\nrequirements = pipdeptree\n",
        "test",
    )
    .expect("Should parse simple document");

    let sections: Vec<&str> = doc.section_names().collect();
    assert_eq!(sections, vec!["SCRIPTS", "sample"]);
    assert_eq!(doc.get("SCRIPTS", "sample.py"), Some("sample"));
    assert_eq!(doc.get("sample", "requirements"), Some("pipdeptree"));
}

#[rstest]
fn test_parse_multiline_value() {
    let doc = CfgDocument::parse(
        "[cc]\nrequirements =\n    cookiecutter\n    pipdeptree\n",
        "test",
    )
    .expect("Should parse multiline value");

    assert_eq!(
        doc.get("cc", "requirements"),
        Some("\ncookiecutter\npipdeptree")
    );
}

#[rstest]
fn test_parse_bare_key() {
    let doc = CfgDocument::parse("[SCRIPTS]\npipdeptree\n", "test").expect("Should parse");

    assert_eq!(doc.get("SCRIPTS", "pipdeptree"), None);
    let items: Vec<_> = doc.items("SCRIPTS").collect();
    assert_eq!(items, vec![("pipdeptree", None)]);
}

#[rstest]
fn test_parse_colon_delimiter() {
    let doc = CfgDocument::parse("[cc]\nrequirements: cookiecutter\n", "test")
        .expect("Should parse colon delimited entry");

    assert_eq!(doc.get("cc", "requirements"), Some("cookiecutter"));
}

#[rstest]
fn test_keys_fold_to_lowercase() {
    let doc =
        CfgDocument::parse("[SCRIPTS]\nSample.py = test\n", "test").expect("Should parse");

    assert_eq!(doc.get("SCRIPTS", "sample.py"), Some("test"));
    assert_eq!(doc.get("SCRIPTS", "Sample.py"), Some("test"));
}

#[rstest]
fn test_section_names_keep_case() {
    let doc = CfgDocument::parse("[Mixed]\n[lower]\n", "test").expect("Should parse");

    assert!(doc.has_section("Mixed"));
    assert!(doc.has_section("lower"));
    assert!(!doc.has_section("mixed"));
}

#[rstest]
#[case("# comment\n[s]\nk = v\n")]
#[case("; comment\n[s]\nk = v\n")]
#[case("[s]\n  # indented comment\nk = v\n")]
fn test_comments_are_skipped(#[case] text: &str) {
    let doc = CfgDocument::parse(text, "test").expect("Should skip comments");
    assert_eq!(doc.get("s", "k"), Some("v"));
}

#[rstest]
fn test_parse_entry_outside_section() {
    let result = CfgDocument::parse("key = value\n", "test");
    assert!(result.is_err(), "Entries before any section should fail");
}

#[rstest]
fn test_parse_unterminated_header() {
    let result = CfgDocument::parse("[broken\n", "test");
    assert!(result.is_err(), "Unterminated headers should fail");
}

#[rstest]
fn test_write_format() {
    let mut doc = CfgDocument::new();
    doc.add_section("SCRIPTS");
    doc.set("SCRIPTS", "sample.py", Some("sample"));
    doc.set("SCRIPTS", "pipdeptree", None);
    doc.set("sample", "requirements", Some("new\nold"));

    assert_eq!(
        doc.to_string(),
        "[SCRIPTS]\nsample.py = sample\npipdeptree\n\n[sample]\nrequirements = new\n\told\n\n"
    );
}

#[rstest]
fn test_round_trip() {
    let text = "[SCRIPTS]\nsample.py = sample\n\n[sample]\nrequirements = \n\tcookiecutter\n\tpipdeptree\n\n";
    let doc = CfgDocument::parse(text, "test").expect("Should parse");

    assert_eq!(
        doc.get("sample", "requirements"),
        Some("\ncookiecutter\npipdeptree")
    );
    assert_eq!(doc.to_string(), text);
}

#[rstest]
fn test_set_preserves_unrelated_sections() {
    let mut doc = CfgDocument::parse("[Ignored]\nkey = value\n\n[sample]\n", "test")
        .expect("Should parse");
    doc.set("sample", "requirements", Some("pkg"));

    assert_eq!(doc.get("Ignored", "key"), Some("value"));
    let sections: Vec<&str> = doc.section_names().collect();
    assert_eq!(sections, vec!["Ignored", "sample"]);
}
