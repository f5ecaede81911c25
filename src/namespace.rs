//! Prefixing of every name coming from one upstream, so that several upstreams can
//! be composed into a single schema without collisions.
//!
//! Root operation types keep their names, since all upstreams share them. Their
//! fields are prefixed instead, and the field configuration gets a `path`
//! pointing back at the upstream's field name. Every other type is prefixed, except
//! for the built-in scalars, and a `TypeConfiguration` maps the prefixed name back
//! to the upstream one.
//!
//! An absent or empty namespace turns every operation into the identity.

use crate::configuration::*;
use crate::errors::ComposeError;
use crate::root_types::{type_definition_name, type_extension_name, RootTypes};
use crate::shared::{for_each_field_container, is_builtin_scalar, map_type_names, parse_schema};
use graphql_parser::schema::{Definition, Document};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespace {
    name: Option<String>,
    skip_rename_root_fields: Vec<String>,
}

impl Namespace {
    pub fn new(name: Option<&str>) -> Namespace {
        Namespace {
            name: name.filter(|name| !name.is_empty()).map(str::to_owned),
            skip_rename_root_fields: Vec::new(),
        }
    }

    /// Root fields that keep their upstream name.
    pub fn skip_rename_root_fields(mut self, fields: Vec<String>) -> Namespace {
        self.skip_rename_root_fields = fields;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    pub fn prefix(&self, name: &str) -> String {
        match &self.name {
            Some(namespace) => format!("{}_{}", namespace, name),
            None => name.to_owned(),
        }
    }

    fn prefix_type(&self, type_name: &str, roots: &RootTypes) -> Option<String> {
        if self.is_empty() || roots.is_root(type_name) || is_builtin_scalar(type_name) {
            None
        } else {
            Some(self.prefix(type_name))
        }
    }

    fn prefix_root_field(&self, field_name: &str) -> Option<String> {
        if self.is_empty() || self.skip_rename_root_fields.iter().any(|f| f == field_name) {
            None
        } else {
            Some(self.prefix(field_name))
        }
    }

    pub fn apply_to_schema(&self, schema: &str) -> Result<String, ComposeError> {
        if self.is_empty() {
            return Ok(schema.to_owned());
        }

        let mut document = parse_schema(schema)?;
        let roots = RootTypes::from_document(&document);

        map_type_names(&mut document, |name| self.prefix_type(name, &roots));
        for_each_field_container(&mut document, |type_name, _, fields| {
            if !roots.is_root(type_name) {
                return;
            }
            for field in fields.iter_mut() {
                if let Some(prefixed) = self.prefix_root_field(&field.name) {
                    field.name = prefixed;
                }
            }
        });

        Ok(document.to_string())
    }

    /// `schema` is the upstream (not yet namespaced) document the nodes were derived from.
    pub fn apply_to_type_fields(
        &self,
        type_fields: &[TypeField],
        schema: &Document<String>,
    ) -> Vec<TypeField> {
        if self.is_empty() {
            return type_fields.to_vec();
        }

        let roots = RootTypes::from_document(schema);
        type_fields
            .iter()
            .map(|type_field| {
                if roots.is_root(&type_field.type_name) {
                    TypeField {
                        type_name: type_field.type_name.clone(),
                        field_names: type_field
                            .field_names
                            .iter()
                            .map(|f| self.prefix_root_field(f).unwrap_or_else(|| f.clone()))
                            .collect(),
                    }
                } else {
                    TypeField {
                        type_name: self
                            .prefix_type(&type_field.type_name, &roots)
                            .unwrap_or_else(|| type_field.type_name.clone()),
                        field_names: type_field.field_names.clone(),
                    }
                }
            })
            .collect()
    }

    /// Prefixes configurations of plain types, and makes sure every renamed root
    /// field has a configuration whose `path` is the upstream field name.
    pub fn apply_to_field_configurations(
        &self,
        fields: &[FieldConfiguration],
        schema: &Document<String>,
    ) -> Vec<FieldConfiguration> {
        if self.is_empty() {
            return fields.to_vec();
        }

        let roots = RootTypes::from_document(schema);
        let mut namespaced: Vec<FieldConfiguration> = fields
            .iter()
            .map(|field| {
                let mut field = field.clone();
                if roots.is_root(&field.type_name) {
                    if let Some(prefixed) = self.prefix_root_field(&field.field_name) {
                        field.path = vec![field.field_name.clone()];
                        field.field_name = prefixed;
                    }
                } else if let Some(prefixed) = self.prefix_type(&field.type_name, &roots) {
                    field.type_name = prefixed;
                }
                field
            })
            .collect();

        for (type_name, field_name) in root_fields(schema, &roots) {
            let prefixed = match self.prefix_root_field(&field_name) {
                Some(prefixed) => prefixed,
                None => continue,
            };
            if namespaced.iter().any(|f| f.is(&type_name, &prefixed)) {
                continue;
            }
            namespaced.push(FieldConfiguration {
                path: vec![field_name],
                ..FieldConfiguration::new(type_name, prefixed)
            });
        }

        namespaced
    }

    /// One configuration per prefixed type, mapping it back to its upstream name.
    pub fn type_configurations(&self, schema: &Document<String>) -> Vec<TypeConfiguration> {
        if self.is_empty() {
            return Vec::new();
        }

        let roots = RootTypes::from_document(schema);
        let mut types: Vec<TypeConfiguration> = Vec::new();
        for definition in schema.definitions.iter() {
            let name = match definition {
                Definition::TypeDefinition(definition) => type_definition_name(definition),
                Definition::TypeExtension(extension) => type_extension_name(extension),
                Definition::SchemaDefinition(_) | Definition::DirectiveDefinition(_) => continue,
            };
            if let Some(prefixed) = self.prefix_type(name, &roots) {
                if !types.iter().any(|t| t.type_name == prefixed) {
                    types.push(TypeConfiguration {
                        type_name: prefixed,
                        rename_to: name.to_owned(),
                    });
                }
            }
        }
        types
    }

    /// Prefixes type configurations produced by a collaborator.
    pub fn apply_to_type_configurations(
        &self,
        types: &[TypeConfiguration],
    ) -> Vec<TypeConfiguration> {
        types
            .iter()
            .map(|t| TypeConfiguration {
                type_name: self.prefix(&t.type_name),
                rename_to: t.rename_to.clone(),
            })
            .collect()
    }

    pub fn apply_to_type_names(&self, type_names: &[String]) -> Vec<String> {
        type_names.iter().map(|name| self.prefix(name)).collect()
    }

    pub fn apply_to_single_type_fields(&self, fields: &[SingleTypeField]) -> Vec<SingleTypeField> {
        fields
            .iter()
            .map(|field| SingleTypeField {
                type_name: self.prefix(&field.type_name),
                field_name: field.field_name.clone(),
            })
            .collect()
    }
}

fn root_fields(schema: &Document<String>, roots: &RootTypes) -> Vec<(String, String)> {
    use graphql_parser::schema::{TypeDefinition, TypeExtension};

    let mut fields = Vec::new();
    for definition in schema.definitions.iter() {
        let (type_name, type_fields) = match definition {
            Definition::TypeDefinition(TypeDefinition::Object(object)) => {
                (&object.name, &object.fields)
            }
            Definition::TypeExtension(TypeExtension::Object(object)) => {
                (&object.name, &object.fields)
            }
            _ => continue,
        };
        if roots.is_root(type_name) {
            fields.extend(type_fields.iter().map(|f| (type_name.clone(), f.name.clone())));
        }
    }
    fields
}
