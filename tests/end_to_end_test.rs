//! End-to-end conversion scenarios.
//!
//! Mirrors a small corpus of representative detections (equality, lists,
//! filters, CIDR, regex, contains-all) and checks the exact emitted
//! Logpoint queries, plus the batch accounting an external harness relies
//! on.

use sigma_logpoint::{
    BackendError, Compiler, CompilerConfig, ConditionNode, Detection, FieldMatch, FieldValue,
    ModifierTag, Selection,
};

#[test]
fn test_single_selection() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "sel",
            vec![Selection::new(
                "sel",
                vec![FieldMatch::scalar("fieldA", "valueA")],
            )],
        )
        .unwrap();
    assert_eq!(compiled.queries[0].text, "fieldA=valueA");
}

#[test]
fn test_or_combination_via_quantifier() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "1 of sel*",
            vec![
                Selection::new("sel1", vec![FieldMatch::scalar("fieldA", "valueA")]),
                Selection::new("sel2", vec![FieldMatch::scalar("fieldB", "valueB")]),
            ],
        )
        .unwrap();
    assert_eq!(compiled.queries[0].text, "fieldA=valueA OR fieldB=valueB");
}

#[test]
fn test_and_with_value_lists() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "sel",
            vec![Selection::new(
                "sel",
                vec![
                    FieldMatch::new(
                        "fieldA",
                        vec!["valueA1".into(), "valueA2".into()],
                        vec![],
                    ),
                    FieldMatch::new(
                        "fieldB",
                        vec!["valueB1".into(), "valueB2".into()],
                        vec![],
                    ),
                ],
            )],
        )
        .unwrap();
    assert_eq!(
        compiled.queries[0].text,
        "fieldA IN [\"valueA1\", \"valueA2\"] AND fieldB IN [\"valueB1\", \"valueB2\"]"
    );
}

#[test]
fn test_field_name_with_whitespace() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "sel",
            vec![Selection::new(
                "sel",
                vec![FieldMatch::scalar("field name", "value")],
            )],
        )
        .unwrap();
    assert_eq!(compiled.queries[0].text, "\"field name\"=value");
}

#[test]
fn test_compact_not() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "not (sel1 or sel2)",
            vec![
                Selection::new("sel1", vec![FieldMatch::scalar("fieldA", "valueA")]),
                Selection::new("sel2", vec![FieldMatch::scalar("fieldB", "valueB")]),
            ],
        )
        .unwrap();
    assert_eq!(
        compiled.queries[0].text,
        "NOT (fieldA=valueA OR fieldB=valueB)"
    );
}

#[test]
fn test_null_filter() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "not filter",
            vec![Selection::new(
                "filter",
                vec![FieldMatch::new("fieldA", vec![FieldValue::Null], vec![])],
            )],
        )
        .unwrap();
    assert_eq!(compiled.queries[0].text, "NOT -fieldA=*");
}

#[test]
fn test_endswith_with_null_and_empty_filters() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "selection and not filter_1 and not filter_2",
            vec![
                Selection::new(
                    "selection",
                    vec![FieldMatch::new(
                        "FieldA",
                        vec!["valueA".into()],
                        vec![ModifierTag::EndsWith],
                    )],
                ),
                Selection::new(
                    "filter_1",
                    vec![FieldMatch::new("FieldB", vec![FieldValue::Null], vec![])],
                ),
                Selection::new(
                    "filter_2",
                    vec![FieldMatch::new(
                        "FieldB",
                        vec![FieldValue::scalar("")],
                        vec![],
                    )],
                ),
            ],
        )
        .unwrap();
    assert_eq!(
        compiled.queries[0].text,
        "FieldA=*valueA AND NOT -FieldB=* AND NOT FieldB=\"\""
    );
}

#[test]
fn test_cidr_with_plain_fields() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "sel",
            vec![Selection::new(
                "sel",
                vec![
                    FieldMatch::new(
                        "field",
                        vec!["192.168.0.0/16".into(), "10.0.0.0/8".into()],
                        vec![ModifierTag::Cidr],
                    ),
                    FieldMatch::scalar("fieldB", "foo"),
                    FieldMatch::scalar("fieldC", "bar"),
                ],
            )],
        )
        .unwrap();
    assert_eq!(
        compiled.queries[0].text,
        "(field IN \"192.168.0.0/16\" OR field IN \"10.0.0.0/8\") AND fieldB=foo AND fieldC=bar"
    );
}

#[test]
fn test_regex_with_plain_field() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "sel",
            vec![Selection::new(
                "sel",
                vec![
                    FieldMatch::new("fieldA", vec!["foo.*bar".into()], vec![ModifierTag::Re]),
                    FieldMatch::scalar("fieldB", "foo"),
                ],
            )],
        )
        .unwrap();
    assert_eq!(compiled.queries[0].text, "fieldA=/foo.*bar/ AND fieldB=foo");
}

#[test]
fn test_contains_all() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "sel",
            vec![Selection::new(
                "sel",
                vec![FieldMatch::new(
                    "fieldA",
                    vec!["valueA".into(), "valueB".into()],
                    vec![ModifierTag::Contains, ModifierTag::All],
                )],
            )],
        )
        .unwrap();
    assert_eq!(
        compiled.queries[0].text,
        "fieldA=*valueA* AND fieldA=*valueB*"
    );
}

#[test]
fn test_scope_qualifier_applies_to_every_query() {
    let config = CompilerConfig::new().with_scope_qualifier("norm_id=WinServer label=Logon");
    let compiler = Compiler::with_config(config);
    let compiled = compiler
        .compile_condition(
            "sel1 or sel2",
            vec![
                Selection::new("sel1", vec![FieldMatch::scalar("fieldA", "valueA")]),
                Selection::new("sel2", vec![FieldMatch::scalar("fieldB", "valueB")]),
            ],
        )
        .unwrap();
    assert_eq!(
        compiled.queries[0].text,
        "norm_id=WinServer label=Logon (fieldA=valueA OR fieldB=valueB)"
    );
}

#[test]
fn test_length_limited_rule_splits_with_coverage_labels() {
    let config = CompilerConfig::new().with_max_query_len(20);
    let compiler = Compiler::with_config(config);
    let compiled = compiler
        .compile_condition(
            "sel1 or sel2",
            vec![
                Selection::new("sel1", vec![FieldMatch::scalar("fieldAAAA", "valueAAAA")]),
                Selection::new("sel2", vec![FieldMatch::scalar("fieldBBBB", "valueBBBB")]),
            ],
        )
        .unwrap();

    assert_eq!(compiled.queries.len(), 2);
    assert_eq!(compiled.queries[0].text, "fieldAAAA=valueAAAA");
    assert_eq!(
        compiled.queries[0].covers.as_deref(),
        Some("sub-condition 1 of 2")
    );
    assert_eq!(
        compiled.queries[1].covers.as_deref(),
        Some("sub-condition 2 of 2")
    );
}

#[test]
fn test_batch_accounting_like_a_corpus_run() {
    let compiler = Compiler::new();

    let detections = vec![
        // Compiles cleanly.
        Detection::new(
            vec![Selection::new(
                "sel",
                vec![FieldMatch::scalar("fieldA", "valueA")],
            )],
            ConditionNode::leaf("sel"),
        ),
        // Dangling selection reference.
        Detection::new(
            vec![Selection::new(
                "sel",
                vec![FieldMatch::scalar("fieldA", "valueA")],
            )],
            ConditionNode::leaf("missing"),
        ),
        // Bad CIDR literal.
        Detection::new(
            vec![Selection::new(
                "sel",
                vec![FieldMatch::new(
                    "src_ip",
                    vec!["10.0.0.0/99".into()],
                    vec![ModifierTag::Cidr],
                )],
            )],
            ConditionNode::leaf("sel"),
        ),
        // Compiles cleanly.
        Detection::new(
            vec![Selection::new(
                "sel",
                vec![FieldMatch::new(
                    "CommandLine",
                    vec!["whoami".into()],
                    vec![ModifierTag::Contains],
                )],
            )],
            ConditionNode::leaf("sel"),
        ),
    ];

    let results = compiler.compile_batch(&detections);
    let success = results.iter().filter(|r| r.is_ok()).count();
    let errors = results.iter().filter(|r| r.is_err()).count();

    assert_eq!(success, 2);
    assert_eq!(errors, 2);
    assert!(matches!(
        results[1],
        Err(BackendError::UnresolvedSelection(_))
    ));
    assert!(matches!(results[2], Err(BackendError::InvalidValue(_))));

    // Modifier coverage across the successful conversions, as a corpus
    // harness would aggregate it.
    let mut exercised: Vec<String> = results
        .iter()
        .flatten()
        .flat_map(|rule| rule.strategies.clone())
        .collect();
    exercised.sort();
    exercised.dedup();
    assert_eq!(exercised, vec!["contains", "equals"]);
}

#[test]
fn test_compiled_rule_serializes_for_reporting() {
    let compiler = Compiler::new();
    let compiled = compiler
        .compile_condition(
            "sel",
            vec![Selection::new(
                "sel",
                vec![FieldMatch::new(
                    "fieldA",
                    vec!["valueA".into(), "valueB".into()],
                    vec![ModifierTag::Contains, ModifierTag::All],
                )],
            )],
        )
        .unwrap();

    let report = serde_json::to_value(&compiled).unwrap();
    assert_eq!(
        report["queries"][0]["text"],
        "fieldA=*valueA* AND fieldA=*valueB*"
    );
    assert_eq!(report["strategies"][0], "contains|all");
    assert!(report["warnings"].as_array().unwrap().is_empty());
}
