//! Replacement of custom scalars (JSON columns and the like) on chosen fields by
//! concrete types, usually declared in the upstream's schema extension.
//!
//! The field's response type becomes `response_type_replacement`. Its arguments
//! typed with a custom scalar become `input_type_replacement` in the schema, and
//! are still rendered with the original scalar when sent upstream.

use crate::schema_configuration::ArgumentReplacement;
use crate::shared::{for_each_field_container, inner_type_name, is_builtin_scalar};
use graphql_parser::schema::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceCustomScalarTypeField {
    /// The type holding the field.
    pub entity_name: String,
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type_replacement: Option<String>,
    pub response_type_replacement: String,
}

impl ReplaceCustomScalarTypeField {
    pub fn new(
        entity_name: impl Into<String>,
        field_name: impl Into<String>,
        response_type_replacement: impl Into<String>,
    ) -> ReplaceCustomScalarTypeField {
        ReplaceCustomScalarTypeField {
            entity_name: entity_name.into(),
            field_name: field_name.into(),
            input_type_replacement: None,
            response_type_replacement: response_type_replacement.into(),
        }
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type_replacement = Some(input_type.into());
        self
    }

    fn is(&self, type_name: &str, field_name: &str) -> bool {
        self.entity_name == type_name && self.field_name == field_name
    }
}

fn custom_scalars(document: &Document<String>) -> Vec<String> {
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::TypeDefinition(TypeDefinition::Scalar(scalar))
                if !is_builtin_scalar(&scalar.name) =>
            {
                Some(scalar.name.clone())
            }
            _ => None,
        })
        .collect()
}

fn replace_inner_type(ty: &mut Type<String>, to: &str) {
    match ty {
        Type::NamedType(name) => *name = to.to_owned(),
        Type::ListType(inner) => replace_inner_type(inner, to),
        Type::NonNullType(inner) => replace_inner_type(inner, to),
    }
}

/// Replaces the types in `document` and returns the argument replacements that
/// keep rendering the replaced arguments with their upstream scalar.
///
/// Only types that are custom scalars declared in `document` are replaced.
pub fn replace_custom_scalars(
    document: &mut Document<String>,
    replacements: &[ReplaceCustomScalarTypeField],
) -> Vec<ArgumentReplacement> {
    let mut argument_replacements = Vec::new();
    if replacements.is_empty() {
        return argument_replacements;
    }

    let scalars = custom_scalars(document);
    let is_custom = |ty: &Type<String>| scalars.iter().any(|s| s == inner_type_name(ty));

    for_each_field_container(document, |type_name, _directives, fields| {
        for field in fields.iter_mut() {
            let replacement = match replacements.iter().find(|r| r.is(type_name, &field.name)) {
                Some(replacement) => replacement,
                None => continue,
            };

            if is_custom(&field.field_type) {
                replace_inner_type(&mut field.field_type, &replacement.response_type_replacement);
            }

            let input_type = match &replacement.input_type_replacement {
                Some(input_type) => input_type,
                None => continue,
            };
            for argument in field.arguments.iter_mut() {
                if !is_custom(&argument.value_type) {
                    continue;
                }
                argument_replacements.push(ArgumentReplacement {
                    type_name: type_name.to_owned(),
                    field_name: field.name.clone(),
                    arg_name: argument.name.clone(),
                    rename_type_to: inner_type_name(&argument.value_type).to_owned(),
                });
                replace_inner_type(&mut argument.value_type, input_type);
            }
        }
    });

    debug!(
        replacements = replacements.len(),
        arguments = argument_replacements.len(),
        "replaced custom scalars"
    );
    argument_replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{normalize_schema, parse_schema};

    const USERS: &str = r#"
        scalar JSON
        type Query { user(id: Int!): User updateContact(id: Int!, contact: JSON!): User }
        type User { id: Int! contact: JSON settings: [JSON!]! }
    "#;

    #[test]
    fn response_types_keep_their_wrappers() {
        let mut document = parse_schema(USERS).unwrap();
        let arguments = replace_custom_scalars(
            &mut document,
            &[
                ReplaceCustomScalarTypeField::new("User", "contact", "Contact"),
                ReplaceCustomScalarTypeField::new("User", "settings", "Setting"),
            ],
        );

        let printed = document.to_string();
        assert!(printed.contains("contact: Contact\n"));
        assert!(printed.contains("settings: [Setting!]!"));
        assert!(arguments.is_empty());
    }

    #[test]
    fn custom_scalar_arguments_render_as_the_upstream_scalar() {
        let mut document = parse_schema(USERS).unwrap();
        let arguments = replace_custom_scalars(
            &mut document,
            &[ReplaceCustomScalarTypeField::new("Query", "updateContact", "User")
                .with_input_type("ContactInput")],
        );

        assert!(document
            .to_string()
            .contains("updateContact(id: Int!, contact: ContactInput!): User"));
        assert_eq!(
            arguments,
            vec![ArgumentReplacement {
                type_name: "Query".to_string(),
                field_name: "updateContact".to_string(),
                arg_name: "contact".to_string(),
                rename_type_to: "JSON".to_string(),
            }]
        );
    }

    #[test]
    fn builtin_and_undeclared_types_are_left_alone() {
        let mut document = parse_schema(USERS).unwrap();
        replace_custom_scalars(
            &mut document,
            &[
                ReplaceCustomScalarTypeField::new("User", "id", "Identifier"),
                ReplaceCustomScalarTypeField::new("Query", "user", "Person"),
            ],
        );

        assert_eq!(document.to_string(), normalize_schema(USERS).unwrap());
    }

    #[test]
    fn replacements_deserialize_from_camel_case() {
        let replacement: ReplaceCustomScalarTypeField = serde_json::from_str(
            r#"{
                "entityName": "users",
                "fieldName": "contact",
                "inputTypeReplacement": "ContactInput",
                "responseTypeReplacement": "Contact"
            }"#,
        )
        .unwrap();

        assert_eq!(
            replacement,
            ReplaceCustomScalarTypeField::new("users", "contact", "Contact")
                .with_input_type("ContactInput")
        );
    }
}
