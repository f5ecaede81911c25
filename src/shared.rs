use crate::errors::ComposeError;
use graphql_parser::schema::*;

/// See https://graphql.org/learn/schema/#scalar-types
pub const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

pub fn parse_schema(schema: &str) -> Result<Document<'_, String>, ComposeError> {
    Ok(graphql_parser::parse_schema::<String>(schema)?)
}

/// Parses and prints `schema`, so that two texts describing the same document compare equal.
pub fn normalize_schema(schema: &str) -> Result<String, ComposeError> {
    Ok(parse_schema(schema)?.to_string())
}

/// The named type at the bottom of list and non-null wrappers.
pub fn inner_type_name<'t>(ty: &'t Type<String>) -> &'t str {
    match ty {
        Type::NamedType(name) => name.as_str(),
        Type::ListType(inner) => inner_type_name(inner),
        Type::NonNullType(inner) => inner_type_name(inner),
    }
}

fn rename_in_place<F>(name: &mut String, rename: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(renamed) = rename(name.as_str()) {
        *name = renamed;
    }
}

fn rename_type_reference<F>(ty: &mut Type<String>, rename: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match ty {
        Type::NamedType(name) => rename_in_place(name, rename),
        Type::ListType(inner) => rename_type_reference(inner, rename),
        Type::NonNullType(inner) => rename_type_reference(inner, rename),
    }
}

fn rename_in_input_values<F>(values: &mut [InputValue<String>], rename: &F)
where
    F: Fn(&str) -> Option<String>,
{
    for value in values.iter_mut() {
        rename_type_reference(&mut value.value_type, rename);
    }
}

fn rename_in_fields<F>(fields: &mut [Field<String>], rename: &F)
where
    F: Fn(&str) -> Option<String>,
{
    for field in fields.iter_mut() {
        rename_type_reference(&mut field.field_type, rename);
        rename_in_input_values(&mut field.arguments, rename);
    }
}

/// Rewrites every type declaration and every reference to a type in `document`.
///
/// `rename` returns the new name, or `None` to keep the current one.
pub fn map_type_names<F>(document: &mut Document<String>, rename: F)
where
    F: Fn(&str) -> Option<String>,
{
    let rename = &rename;

    for definition in document.definitions.iter_mut() {
        match definition {
            Definition::SchemaDefinition(schema) => {
                for name in schema
                    .query
                    .iter_mut()
                    .chain(schema.mutation.iter_mut())
                    .chain(schema.subscription.iter_mut())
                {
                    rename_in_place(name, rename);
                }
            }
            Definition::TypeDefinition(type_definition) => match type_definition {
                TypeDefinition::Scalar(scalar) => rename_in_place(&mut scalar.name, rename),
                TypeDefinition::Object(object) => {
                    rename_in_place(&mut object.name, rename);
                    for interface in object.implements_interfaces.iter_mut() {
                        rename_in_place(interface, rename);
                    }
                    rename_in_fields(&mut object.fields, rename);
                }
                TypeDefinition::Interface(interface) => {
                    rename_in_place(&mut interface.name, rename);
                    for parent in interface.implements_interfaces.iter_mut() {
                        rename_in_place(parent, rename);
                    }
                    rename_in_fields(&mut interface.fields, rename);
                }
                TypeDefinition::Union(union) => {
                    rename_in_place(&mut union.name, rename);
                    for member in union.types.iter_mut() {
                        rename_in_place(member, rename);
                    }
                }
                TypeDefinition::Enum(enm) => rename_in_place(&mut enm.name, rename),
                TypeDefinition::InputObject(input) => {
                    rename_in_place(&mut input.name, rename);
                    rename_in_input_values(&mut input.fields, rename);
                }
            },
            Definition::TypeExtension(extension) => match extension {
                TypeExtension::Scalar(scalar) => rename_in_place(&mut scalar.name, rename),
                TypeExtension::Object(object) => {
                    rename_in_place(&mut object.name, rename);
                    for interface in object.implements_interfaces.iter_mut() {
                        rename_in_place(interface, rename);
                    }
                    rename_in_fields(&mut object.fields, rename);
                }
                TypeExtension::Interface(interface) => {
                    rename_in_place(&mut interface.name, rename);
                    for parent in interface.implements_interfaces.iter_mut() {
                        rename_in_place(parent, rename);
                    }
                    rename_in_fields(&mut interface.fields, rename);
                }
                TypeExtension::Union(union) => {
                    rename_in_place(&mut union.name, rename);
                    for member in union.types.iter_mut() {
                        rename_in_place(member, rename);
                    }
                }
                TypeExtension::Enum(enm) => rename_in_place(&mut enm.name, rename),
                TypeExtension::InputObject(input) => {
                    rename_in_place(&mut input.name, rename);
                    rename_in_input_values(&mut input.fields, rename);
                }
            },
            Definition::DirectiveDefinition(directive) => {
                rename_in_input_values(&mut directive.arguments, rename);
            }
        }
    }
}

/// Calls `f` with the name, directives and fields of every object and interface
/// type, definitions and extensions alike.
pub fn for_each_field_container<F>(document: &mut Document<String>, mut f: F)
where
    F: FnMut(&str, &mut Vec<Directive<String>>, &mut Vec<Field<String>>),
{
    for definition in document.definitions.iter_mut() {
        match definition {
            Definition::TypeDefinition(TypeDefinition::Object(object)) => {
                f(&object.name, &mut object.directives, &mut object.fields)
            }
            Definition::TypeDefinition(TypeDefinition::Interface(interface)) => {
                f(&interface.name, &mut interface.directives, &mut interface.fields)
            }
            Definition::TypeExtension(TypeExtension::Object(object)) => {
                f(&object.name, &mut object.directives, &mut object.fields)
            }
            Definition::TypeExtension(TypeExtension::Interface(interface)) => {
                f(&interface.name, &mut interface.directives, &mut interface.fields)
            }
            _ => (),
        }
    }
}

/// The string value of argument `argument` on `directive`, if it is a string.
pub fn string_argument<'a, 'b>(
    directive: &'b Directive<'a, String>,
    argument: &str,
) -> Option<&'b str> {
    directive
        .arguments
        .iter()
        .find(|(name, _)| name == argument)
        .and_then(|(_, value)| match value {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        })
}
