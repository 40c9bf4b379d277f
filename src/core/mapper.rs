use crate::core::{InputRow, MappedProperty, ObjectKind, PropertyDefinition, PropertyOption, Result};

pub const ENUMERATION_TYPE: &str = "enumeration";
pub const NUMBER_TYPE: &str = "number";
pub const NUMBER_DISPLAY_HINT: &str = "unformatted";

/// Validates the row's object kind and builds the property definition to submit.
pub fn map_row(row: &InputRow) -> Result<MappedProperty> {
    let kind: ObjectKind = row.object_type.parse()?;

    let property_type = row.property_type.trim().to_string();
    let field_type = row.field_type.trim().to_string();

    let options = if property_type.eq_ignore_ascii_case(ENUMERATION_TYPE) {
        Some(parse_options(&row.options))
    } else {
        None
    };

    let number_display_hint = if property_type.eq_ignore_ascii_case(NUMBER_TYPE)
        && field_type.eq_ignore_ascii_case(NUMBER_TYPE)
    {
        Some(NUMBER_DISPLAY_HINT.to_string())
    } else {
        None
    };

    Ok(MappedProperty {
        kind,
        definition: PropertyDefinition {
            name: row.name.trim().to_string(),
            label: row.label.trim().to_string(),
            description: row.description.trim().to_string(),
            group_name: row.group_name.trim().to_string(),
            property_type,
            field_type,
            form_field: true,
            options,
            number_display_hint,
        },
    })
}

/// `|`-separated list; a literal `|` inside an option cannot be expressed.
pub fn parse_options(raw: &str) -> Vec<PropertyOption> {
    raw.split('|')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(|option| PropertyOption {
            label: capitalize(option),
            value: option.to_lowercase(),
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
