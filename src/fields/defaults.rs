use super::schema::{CheckboxDefinition, FieldDefinition, SchemaDefinition};

pub const CHECKBOX_PROMPT: &str = "6. Check the appropriate box and complete:";
pub const PROJECT_TYPE_PLACEHOLDER: &str = "{Project type}";
pub const REGULATORY_PART_PLACEHOLDER: &str = "{CFR part}";
pub const OPTION_PLACEHOLDER: &str = "{Action option}";
pub const DOCKET_PLACEHOLDER: &str = "{Docket number}";
pub const NOTICE_PLACEHOLDER: &str = "{Notice number}";

pub const MANDATORY_PLACEHOLDERS: &[&str] = &["{Applicant name}", "{Airplane model}"];
pub const MANDATORY_QUESTIONS: &[&str] = &["15", "16", "17"];

// (worksheet label, placeholder, multiline)
const FIELDS: &[(&str, &str, bool)] = &[
    ("Applicant name:", "{Applicant name}", false),
    ("Airplane manufacturer:", "{Airplane manufacturer}", false),
    ("Airplane model:", "{Airplane model}", false),
    ("Derivative model (if applicable):", "{Derivative model}", false),
    (
        "Subject of special conditions:",
        "{Subject of special conditions}",
        false,
    ),
    ("CPN project number:", "{CPN project number}", false),
    ("Date of application:", "{Date of application}", false),
    (
        "Anticipated certification date:",
        "{Anticipated certification date}",
        false,
    ),
    ("Anticipated delivery date:", "{Anticipated delivery date}", false),
    (
        "Type of airplane: transport category, freighter, VIP, business jet, etc.",
        "{Type of airplane}",
        false,
    ),
    ("Number of engines (twin-engine, etc.):", "{Number of engines}", false),
    (
        "Maximum passenger capacity of all listed aircraft:",
        "{Maximum passenger capacity}",
        false,
    ),
    (
        "Maximum takeoff weight of all listed aircraft:",
        "{Maximum takeoff weight}",
        false,
    ),
    (
        "TC number (does not apply to new TC project):",
        "{TC number}",
        false,
    ),
    ("Name of SME:", "{SME name}", false),
    ("Section name:", "{SME section}", false),
    ("Routing symbol:", "{SME routing symbol}", false),
    ("SME Regional Office address:", "{SME office address}", false),
    ("Telephone phone no:", "{SME phone}", false),
    ("E-mail:", "{SME email}", false),
    (
        "Action prompting special conditions:",
        "{Action option}",
        false,
    ),
    (
        "Briefly (one to three sentences) provide a summary of the novel or unusual design features of the airplane.",
        "{Summary}",
        true,
    ),
    (
        "Provide a detailed discussion of the special conditions.",
        "{Description}",
        true,
    ),
    (
        "Provide the text of the special conditions.",
        "{SpecialConditions}",
        true,
    ),
];

const CHECKBOXES: &[(&str, &str)] = &[
    ("☒ This is a new TC project", "new TC"),
    ("☒ This is an amended TC project", "amended TC"),
    ("☒ This is a change", "change"),
    ("☒ This is an STC project", "STC"),
];

pub fn fields() -> Vec<FieldDefinition> {
    FIELDS
        .iter()
        .map(|(label, placeholder, multiline)| FieldDefinition {
            label: (*label).to_string(),
            placeholder: (*placeholder).to_string(),
            multiline: *multiline,
        })
        .collect()
}

pub fn checkboxes() -> Vec<CheckboxDefinition> {
    CHECKBOXES
        .iter()
        .map(|(label, value)| CheckboxDefinition {
            label: (*label).to_string(),
            value: (*value).to_string(),
        })
        .collect()
}

pub fn definition() -> SchemaDefinition {
    SchemaDefinition {
        fields: fields(),
        ..SchemaDefinition::default()
    }
}
