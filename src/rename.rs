//! User-declared renames of types and fields, applied to schema text and to the
//! node lists and field configurations derived from it.
//!
//! Every function returns a new value and leaves its input untouched. A rename
//! that matches nothing in a given structure leaves that structure unchanged.

use crate::configuration::*;
use crate::errors::ComposeError;
use crate::selection_set::parse_selection_set;
use crate::shared::{for_each_field_container, inner_type_name, map_type_names, parse_schema};
use graphql_parser::schema::{Directive, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameType {
    pub from: String,
    pub to: String,
}

impl RenameType {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> RenameType {
        RenameType {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTypeField {
    pub type_name: String,
    pub from_field_name: String,
    pub to_field_name: String,
}

impl RenameTypeField {
    pub fn new(
        type_name: impl Into<String>,
        from_field_name: impl Into<String>,
        to_field_name: impl Into<String>,
    ) -> RenameTypeField {
        RenameTypeField {
            type_name: type_name.into(),
            from_field_name: from_field_name.into(),
            to_field_name: to_field_name.into(),
        }
    }
}

fn renamed_type<'r>(renames: &'r [RenameType], type_name: &str) -> Option<&'r str> {
    renames
        .iter()
        .find(|rename| rename.from == type_name)
        .map(|rename| rename.to.as_str())
}

fn renamed_field<'r>(
    renames: &'r [RenameTypeField],
    type_name: &str,
    field_name: &str,
) -> Option<&'r str> {
    renames
        .iter()
        .find(|rename| rename.type_name == type_name && rename.from_field_name == field_name)
        .map(|rename| rename.to_field_name.as_str())
}

pub fn rename_types_in_schema(
    schema: &str,
    renames: &[RenameType],
) -> Result<String, ComposeError> {
    if renames.is_empty() {
        return Ok(schema.to_owned());
    }

    let mut document = parse_schema(schema)?;
    map_type_names(&mut document, |name| renamed_type(renames, name).map(str::to_owned));
    Ok(document.to_string())
}

/// Renames field declarations, and the matching top-level names in federation
/// field sets: `@key` and `@requires` select fields of the type they sit on,
/// `@provides` selects fields of the type its field returns.
pub fn rename_type_fields_in_schema(
    schema: &str,
    renames: &[RenameTypeField],
) -> Result<String, ComposeError> {
    if renames.is_empty() {
        return Ok(schema.to_owned());
    }

    let mut document = parse_schema(schema)?;
    let mut result = Ok(());

    for_each_field_container(&mut document, |type_name, directives, fields| {
        for field in fields.iter_mut() {
            let returned_type = inner_type_name(&field.field_type).to_owned();
            for directive in field.directives.iter_mut() {
                let selected_type = match directive.name.as_str() {
                    "requires" => type_name,
                    "provides" => returned_type.as_str(),
                    _ => continue,
                };
                if let Err(err) = rename_field_set(directive, selected_type, renames) {
                    result = Err(err);
                }
            }

            if let Some(to) = renamed_field(renames, type_name, &field.name) {
                field.name = to.to_owned();
            }
        }

        for directive in directives.iter_mut().filter(|d| d.name == "key") {
            if let Err(err) = rename_field_set(directive, type_name, renames) {
                result = Err(err);
            }
        }
    });

    result?;
    Ok(document.to_string())
}

/// Rewrites the `fields` argument of a federation directive, whose top-level
/// selections are fields of `type_name`.
fn rename_field_set(
    directive: &mut Directive<String>,
    type_name: &str,
    renames: &[RenameTypeField],
) -> Result<(), ComposeError> {
    for (name, value) in directive.arguments.iter_mut() {
        if name.as_str() != "fields" {
            continue;
        }
        if let Value::String(field_set) = value {
            let mut selection = parse_selection_set(field_set)?;
            let mut changed = false;
            for field in selection.fields.iter_mut() {
                if let Some(to) = renamed_field(renames, type_name, &field.name) {
                    field.name = to.to_owned();
                    changed = true;
                }
            }
            if changed {
                *field_set = selection.to_string();
            }
        }
    }

    Ok(())
}

pub fn rename_types_in_type_fields(
    type_fields: &[TypeField],
    renames: &[RenameType],
) -> Vec<TypeField> {
    type_fields
        .iter()
        .map(|node| TypeField {
            type_name: renamed_type(renames, &node.type_name)
                .unwrap_or(&node.type_name)
                .to_owned(),
            field_names: node.field_names.clone(),
        })
        .collect()
}

pub fn rename_type_fields_in_type_fields(
    type_fields: &[TypeField],
    renames: &[RenameTypeField],
) -> Vec<TypeField> {
    type_fields
        .iter()
        .map(|node| TypeField {
            type_name: node.type_name.clone(),
            field_names: node
                .field_names
                .iter()
                .map(|field| {
                    renamed_field(renames, &node.type_name, field)
                        .unwrap_or(field)
                        .to_owned()
                })
                .collect(),
        })
        .collect()
}

pub fn rename_types_in_field_configurations(
    fields: &[FieldConfiguration],
    renames: &[RenameType],
) -> Vec<FieldConfiguration> {
    fields
        .iter()
        .map(|field| FieldConfiguration {
            type_name: renamed_type(renames, &field.type_name)
                .unwrap_or(&field.type_name)
                .to_owned(),
            ..field.clone()
        })
        .collect()
}

/// Every configuration on the renamed field's type gets the rename applied to
/// `requires_fields` and to the source path of object-field arguments. The
/// renamed field itself also gets its new name, and its own name replaced in
/// its `path`.
pub fn rename_type_fields_in_field_configurations(
    fields: &[FieldConfiguration],
    renames: &[RenameTypeField],
) -> Vec<FieldConfiguration> {
    fields
        .iter()
        .map(|field| {
            let rename_item = |item: &String| {
                renamed_field(renames, &field.type_name, item)
                    .unwrap_or(item)
                    .to_owned()
            };

            let mut renamed = FieldConfiguration {
                requires_fields: field.requires_fields.iter().map(&rename_item).collect(),
                arguments_configuration: field
                    .arguments_configuration
                    .iter()
                    .map(|argument| match argument.source_type {
                        ArgumentSource::ObjectField => ArgumentConfiguration {
                            source_path: argument.source_path.iter().map(&rename_item).collect(),
                            ..argument.clone()
                        },
                        ArgumentSource::FieldArgument => argument.clone(),
                    })
                    .collect(),
                ..field.clone()
            };

            if let Some(to) = renamed_field(renames, &field.type_name, &field.field_name) {
                renamed.field_name = to.to_owned();
                for item in renamed.path.iter_mut().filter(|item| **item == field.field_name) {
                    *item = to.to_owned();
                }
            }

            renamed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::normalize_schema;

    #[test]
    fn swapping_type_names() {
        let schema =
            normalize_schema("type Query { a: A b: B } type A { id: ID } type B { id: ID }")
                .unwrap();
        let renamed = rename_types_in_schema(
            &schema,
            &[RenameType::new("A", "B"), RenameType::new("B", "A")],
        )
        .unwrap();

        assert_eq!(
            renamed,
            normalize_schema("type Query { a: B b: A } type B { id: ID } type A { id: ID }")
                .unwrap()
        );
    }

    #[test]
    fn field_renames_follow_the_type() {
        let schema = normalize_schema(
            "type Query { user: User } type User { name: String } type Pet { name: String }",
        )
        .unwrap();
        let renames = [RenameTypeField::new("User", "name", "fullName")];
        let renamed = rename_type_fields_in_schema(&schema, &renames).unwrap();

        assert_eq!(
            renamed,
            normalize_schema(
                "type Query { user: User } type User { fullName: String } type Pet { name: String }"
            )
            .unwrap()
        );
    }

    #[test]
    fn key_field_sets_are_renamed() {
        let schema =
            normalize_schema(r#"type User @key(fields: "id org { id }") { id: ID! org: Org }"#)
                .unwrap();
        let renames = [RenameTypeField::new("User", "id", "userId")];
        let renamed = rename_type_fields_in_schema(&schema, &renames).unwrap();

        assert!(renamed.contains(r#"@key(fields: "userId org { id }")"#));
        assert!(renamed.contains("userId: ID!"));
    }

    #[test]
    fn requires_and_provides_field_sets_are_renamed() {
        let schema = normalize_schema(
            r#"
            extend type User @key(fields: "id") {
                id: ID! @external
                email: String @external
                reviews: [Review] @requires(fields: "email")
            }
            type Review @key(fields: "id") {
                id: ID!
                author: User @provides(fields: "email")
                product: Product @provides(fields: "email")
            }
            "#,
        )
        .unwrap();
        let renames = [RenameTypeField::new("User", "email", "mail")];
        let renamed = rename_type_fields_in_schema(&schema, &renames).unwrap();

        assert!(renamed.contains(r#"reviews: [Review] @requires(fields: "mail")"#));
        assert!(renamed.contains(r#"author: User @provides(fields: "mail")"#));
        assert!(renamed.contains(r#"product: Product @provides(fields: "email")"#));
        assert!(renamed.contains("mail: String @external"));
    }

    #[test]
    fn no_renames_leave_the_text_alone() {
        let schema = "type Query {a:Int}";
        assert_eq!(rename_types_in_schema(schema, &[]).unwrap(), schema);
        assert_eq!(rename_type_fields_in_schema(schema, &[]).unwrap(), schema);
    }

    #[test]
    fn field_configurations_of_the_renamed_field() {
        let mut field = FieldConfiguration::new("User", "name");
        field.path = vec!["name".to_string(), "first".to_string()];

        let renamed = rename_type_fields_in_field_configurations(
            &[field],
            &[RenameTypeField::new("User", "name", "fullName")],
        );

        assert_eq!(renamed[0].field_name, "fullName");
        assert_eq!(renamed[0].path, vec!["fullName".to_string(), "first".to_string()]);
    }

    #[test]
    fn batched_renames_reach_the_renamed_field_requirements() {
        let field = FieldConfiguration {
            requires_fields: vec!["id".to_string()],
            arguments_configuration: vec![ArgumentConfiguration::object_field(
                "authorId",
                vec!["id"],
            )],
            ..FieldConfiguration::new("User", "reviews")
        };

        let renamed = rename_type_fields_in_field_configurations(
            &[field],
            &[
                RenameTypeField::new("User", "id", "userId"),
                RenameTypeField::new("User", "reviews", "posts"),
            ],
        );

        assert_eq!(renamed[0].field_name, "posts");
        assert_eq!(renamed[0].requires_fields, vec!["userId".to_string()]);
        assert_eq!(
            renamed[0].arguments_configuration[0].source_path,
            vec!["userId".to_string()]
        );
    }

    #[test]
    fn object_field_source_paths_are_renamed_but_field_arguments_are_not() {
        let mut field = FieldConfiguration::new("User", "posts");
        field.requires_fields = vec!["id".to_string(), "name".to_string()];
        field.arguments_configuration = vec![
            ArgumentConfiguration::object_field("authorId", vec!["id"]),
            ArgumentConfiguration {
                source_path: vec!["id".to_string()],
                ..ArgumentConfiguration::field_argument("id")
            },
        ];
        let other_type = FieldConfiguration {
            requires_fields: vec!["id".to_string()],
            ..FieldConfiguration::new("Pet", "owner")
        };

        let renamed = rename_type_fields_in_field_configurations(
            &[field, other_type.clone()],
            &[RenameTypeField::new("User", "id", "userId")],
        );

        assert_eq!(renamed[0].requires_fields, vec!["userId".to_string(), "name".to_string()]);
        assert_eq!(
            renamed[0].arguments_configuration[0].source_path,
            vec!["userId".to_string()]
        );
        assert_eq!(renamed[0].arguments_configuration[1].source_path, vec!["id".to_string()]);
        assert_eq!(renamed[1], other_type);
    }

    #[test]
    fn type_fields() {
        let nodes = vec![
            TypeField::with_fields("User", vec!["id", "name"]),
            TypeField::with_fields("Pet", vec!["name"]),
        ];

        assert_eq!(
            rename_types_in_type_fields(&nodes, &[RenameType::new("User", "Person")])[0].type_name,
            "Person"
        );
        assert_eq!(
            rename_type_fields_in_type_fields(
                &nodes,
                &[RenameTypeField::new("User", "name", "fullName")]
            ),
            vec![
                TypeField::with_fields("User", vec!["id", "fullName"]),
                TypeField::with_fields("Pet", vec!["name"]),
            ]
        );
    }
}
