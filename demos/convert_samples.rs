//! Sample detections run through the Logpoint compiler.
//!
//! Builds a handful of representative detections in memory and prints the
//! emitted queries, one sample per line group.

use sigma_logpoint::{Compiler, FieldMatch, FieldValue, ModifierTag, Selection};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let compiler = Compiler::new();

    let samples: Vec<(&str, &str, Vec<Selection>)> = vec![
        (
            "Single selection",
            "sel",
            vec![Selection::new(
                "sel",
                vec![FieldMatch::scalar("fieldA", "valueA")],
            )],
        ),
        (
            "OR combination",
            "1 of sel*",
            vec![
                Selection::new("sel1", vec![FieldMatch::scalar("fieldA", "valueA")]),
                Selection::new("sel2", vec![FieldMatch::scalar("fieldB", "valueB")]),
            ],
        ),
        (
            "AND with lists",
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
        ),
        (
            "Field name with whitespace",
            "sel",
            vec![Selection::new(
                "sel",
                vec![FieldMatch::scalar("field name", "value")],
            )],
        ),
        (
            "Compact NOT",
            "not (sel1 or sel2)",
            vec![
                Selection::new("sel1", vec![FieldMatch::scalar("fieldA", "valueA")]),
                Selection::new("sel2", vec![FieldMatch::scalar("fieldB", "valueB")]),
            ],
        ),
        (
            "Null filter",
            "not filter",
            vec![Selection::new(
                "filter",
                vec![FieldMatch::new("fieldA", vec![FieldValue::Null], vec![])],
            )],
        ),
        (
            "Endswith and null filters",
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
        ),
        (
            "CIDR",
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
        ),
        (
            "Regex",
            "sel",
            vec![Selection::new(
                "sel",
                vec![
                    FieldMatch::new("fieldA", vec!["foo.*bar".into()], vec![ModifierTag::Re]),
                    FieldMatch::scalar("fieldB", "foo"),
                ],
            )],
        ),
        (
            "Contains all",
            "sel",
            vec![Selection::new(
                "sel",
                vec![FieldMatch::new(
                    "fieldA",
                    vec!["valueA".into(), "valueB".into()],
                    vec![ModifierTag::Contains, ModifierTag::All],
                )],
            )],
        ),
    ];

    for (index, (title, condition, selections)) in samples.into_iter().enumerate() {
        let compiled = compiler.compile_condition(condition, selections)?;
        println!("{}. {title}:", index + 1);
        for query in &compiled.queries {
            println!("   {}", query.text);
        }
        println!();
    }

    Ok(())
}
