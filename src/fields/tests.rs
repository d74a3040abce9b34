use std::path::PathBuf;

use super::*;

fn builtin() -> FieldSchema {
    FieldSchema::builtin().expect("builtin schema compiles")
}

fn schema_with(fields: &[(&str, &str, bool)]) -> FieldSchema {
    FieldSchema::from_definition(SchemaDefinition {
        fields: fields
            .iter()
            .map(|(label, placeholder, multiline)| FieldDefinition {
                label: (*label).to_string(),
                placeholder: (*placeholder).to_string(),
                multiline: *multiline,
            })
            .collect(),
        ..SchemaDefinition::default()
    })
    .expect("schema compiles")
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("scdocbuilder-fields-{}-{name}", std::process::id()))
}

#[test]
fn builtin_schema_covers_worksheet_vocabulary() {
    let schema = builtin();

    assert!(schema.fields().len() >= 20);
    assert_eq!(schema.checkboxes().len(), 4);
    assert_eq!(schema.mandatory_questions, vec!["15", "16", "17"]);
    assert_eq!(
        schema.mandatory_placeholders,
        vec!["{Applicant name}", "{Airplane model}"]
    );

    let multiline: Vec<&str> = schema
        .fields()
        .iter()
        .filter(|field| field.multiline)
        .map(|field| field.placeholder.as_str())
        .collect();
    assert_eq!(multiline, vec!["{Summary}", "{Description}", "{SpecialConditions}"]);

    let placeholders = schema.extracted_placeholders();
    assert!(placeholders.contains(&"{Project type}"));
    assert!(placeholders.contains(&"{CFR part}"));
    assert!(placeholders.contains(&"{TC number}"));
}

#[test]
fn labels_are_stored_normalized() {
    let schema = builtin();
    let field = schema
        .field_for_placeholder("{Applicant name}")
        .expect("applicant field exists");
    assert_eq!(field.label, "Applicant name");
    assert!(!field.is_tc_number());
    assert!(
        schema
            .field_for_placeholder("{TC number}")
            .expect("tc field exists")
            .is_tc_number()
    );
}

#[test]
fn match_label_prefers_exact_then_prefix_then_longer_label() {
    let schema = schema_with(&[
        ("Name:", "{Name}", false),
        ("Name of SME:", "{SME name}", false),
        ("Section name:", "{Section}", false),
    ]);

    let exact = schema.match_label("Name").expect("exact match");
    assert_eq!(exact.kind, MatchKind::Exact);
    assert_eq!(exact.field.placeholder, "{Name}");

    let prefix = schema
        .match_label(&schema.normalize("Name of SME: Jane"))
        .expect("prefix match");
    assert_eq!(prefix.kind, MatchKind::Prefix);
    assert_eq!(prefix.field.placeholder, "{SME name}");

    let contains = schema
        .match_label(&schema.normalize("Branch Section name: Avionics"))
        .expect("contains match");
    assert_eq!(contains.kind, MatchKind::Contains);
    assert_eq!(contains.field.placeholder, "{Section}");

    assert!(schema.match_label("").is_none());
    assert!(schema.match_label("Unrelated").is_none());
}

#[test]
fn inline_value_reads_raw_text_after_label() {
    let schema = builtin();
    let field = schema
        .field_for_placeholder("{Applicant name}")
        .expect("applicant field exists");

    assert_eq!(
        field.inline_value("a.  Applicant   name :  Foo  Corp, Inc. ").as_deref(),
        Some("Foo  Corp, Inc.")
    );
    assert_eq!(field.inline_value("Applicant name:").as_deref(), Some(""));
    assert_eq!(field.inline_value("Airplane model: X"), None);
}

#[test]
fn checkbox_requires_option_to_follow_checked_glyph() {
    let schema = builtin();
    let change = schema
        .checkboxes()
        .iter()
        .find(|option| option.value == "change")
        .expect("change option exists");

    assert_eq!(change.label, "This is a change");
    assert!(change.is_checked_in("☒  This is a change to TC A123"));
    assert!(!change.is_checked_in("☐ This is a change"));
    assert!(!change.is_checked_in("☐ This is a change ☒ This is an STC project"));
}

#[test]
fn question_prompt_accepts_numbered_headers_not_list_markers() {
    let schema = builtin();
    assert!(schema.is_question_prompt("Question 15: Describe"));
    assert!(schema.is_question_prompt("  16. What applies?"));
    assert!(schema.is_question_prompt("17."));
    assert!(!schema.is_question_prompt("1) Step one"));
    assert!(!schema.is_question_prompt("1.5 tonnes"));
    assert!(!schema.is_question_prompt("Questionnaire"));
}

#[test]
fn multiline_terminators() {
    let schema = schema_with(&[
        ("Description:", "{Description}", true),
        ("Next field:", "{Next}", false),
        ("Provide the text of the special conditions.", "{SpecialConditions}", true),
    ]);

    assert!(schema.ends_multiline(""));
    assert!(schema.ends_multiline("   "));
    assert!(schema.ends_multiline("Next field: value"));
    assert!(schema.ends_multiline("3. Another section"));
    assert!(schema.ends_multiline("See: Provide the text of the special conditions."));
    assert!(!schema.ends_multiline("The Next field: is mentioned mid-line"));
    assert!(!schema.ends_multiline("1) Step one"));
    assert!(!schema.ends_multiline("Line 2"));
}

#[test]
fn checkbox_prompt_tolerates_spacing() {
    let schema = builtin();
    assert!(schema.is_checkbox_prompt("6.\tCheck the appropriate box and complete:"));
    assert!(schema.is_checkbox_prompt("6. Check the appropriate box and complete :"));
    assert!(!schema.is_checkbox_prompt("Check the appropriate box"));
}

#[test]
fn from_definition_rejects_bad_schemas() {
    let definition = |fields: Vec<(&str, &str)>| SchemaDefinition {
        fields: fields
            .into_iter()
            .map(|(label, placeholder)| FieldDefinition {
                label: label.to_string(),
                placeholder: placeholder.to_string(),
                multiline: false,
            })
            .collect(),
        ..SchemaDefinition::default()
    };

    assert!(matches!(
        FieldSchema::from_definition(definition(vec![])),
        Err(SchemaError::NoFields)
    ));
    assert!(matches!(
        FieldSchema::from_definition(definition(vec![("a.:", "{A}")])),
        Err(SchemaError::EmptyLabel(_))
    ));
    assert!(matches!(
        FieldSchema::from_definition(definition(vec![("Name", "Name")])),
        Err(SchemaError::BadPlaceholder(_))
    ));
    assert!(matches!(
        FieldSchema::from_definition(definition(vec![("Name:", "{A}"), ("b. Name", "{B}")])),
        Err(SchemaError::DuplicateLabel { .. })
    ));
}

#[test]
fn load_reads_flat_json_and_structured_toml() {
    let json_path = scratch_path("flat.json");
    fs::write(
        &json_path,
        r#"{"Applicant name:": "{Applicant name}", "Airplane model:": "{Airplane model}"}"#,
    )
    .expect("schema writes");
    let flat = FieldSchema::load(&json_path).expect("flat schema loads");
    assert_eq!(flat.fields().len(), 2);
    assert!(flat.fields().iter().all(|field| !field.multiline));
    assert_eq!(flat.option_placeholder, "{Action option}");
    fs::remove_file(&json_path).expect("schema removed");

    let toml_path = scratch_path("structured.toml");
    fs::write(
        &toml_path,
        r#"
mandatory_questions = ["1"]
option_placeholder = "{Option}"

[[fields]]
label = "Description:"
placeholder = "{Description}"
multiline = true

[[fields]]
label = "Owner:"
placeholder = "{Owner}"
"#,
    )
    .expect("schema writes");
    let structured = FieldSchema::load(&toml_path).expect("structured schema loads");
    assert_eq!(structured.fields().len(), 2);
    assert!(structured.fields()[0].multiline);
    assert_eq!(structured.mandatory_questions, vec!["1"]);
    assert_eq!(structured.option_placeholder, "{Option}");
    assert_eq!(structured.checkboxes().len(), 4);
    fs::remove_file(&toml_path).expect("schema removed");
}

#[test]
fn load_maps_failures_to_typed_errors() {
    let missing = scratch_path("missing.json");
    assert!(matches!(
        FieldSchema::load(&missing),
        Err(FillError::NotFound { .. })
    ));

    let yaml = scratch_path("schema.yaml");
    fs::write(&yaml, "Applicant name: '{Applicant name}'").expect("schema writes");
    assert!(matches!(
        FieldSchema::load(&yaml),
        Err(FillError::Schema {
            source: SchemaError::Format(_),
            ..
        })
    ));
    fs::remove_file(&yaml).expect("schema removed");

    let broken = scratch_path("broken.json");
    fs::write(&broken, "[1, 2").expect("schema writes");
    let err = FieldSchema::load(&broken).expect_err("broken json fails");
    assert_eq!(err.exit_code(), crate::error::EXIT_VALIDATION);
    fs::remove_file(&broken).expect("schema removed");
}
