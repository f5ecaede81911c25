//! Classification of a schema's fields into root nodes (entry points) and child
//! nodes (reachable by traversal), with the argument and required-field metadata
//! the execution engine needs to plan fetches.

use crate::configuration::*;
use crate::errors::ComposeError;
use crate::root_types::RootTypes;
use crate::selection_set::parse_selection_set;
use crate::shared::string_argument;
use crate::visitor::{walk_document, Node, Visitor};
use graphql_parser::schema::Document;

/// Overrides the type an argument is rendered with when sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentReplacement {
    pub type_name: String,
    pub field_name: String,
    pub arg_name: String,
    pub rename_type_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphQLConfiguration {
    pub root_nodes: Vec<TypeField>,
    pub child_nodes: Vec<TypeField>,
    pub fields: Vec<FieldConfiguration>,
    pub types: Vec<TypeConfiguration>,
}

impl GraphQLConfiguration {
    fn add_field_argument(
        &mut self,
        type_name: &str,
        field_name: &str,
        arg_name: &str,
        argument_replacements: &[ArgumentReplacement],
    ) {
        let mut argument = ArgumentConfiguration::field_argument(arg_name);
        if let Some(replacement) = argument_replacements.iter().find(|replacement| {
            replacement.type_name == type_name
                && replacement.field_name == field_name
                && replacement.arg_name == arg_name
        }) {
            argument.rename_type_to = replacement.rename_type_to.clone();
        }

        field_configuration_mut(&mut self.fields, type_name, field_name).upsert_argument(argument);
    }

    fn add_required_fields(&mut self, type_name: &str, field_name: &str, required: &[String]) {
        if required.is_empty() {
            return;
        }

        let field = field_configuration_mut(&mut self.fields, type_name, field_name);
        for required_field in required.iter() {
            field.add_required_field(required_field);
        }
    }
}

/// Classifies every field of `schema`, or of `service_sdl` when given.
///
/// Federation subgraphs expose their own SDL (with `@key`, `@extends` and
/// `@external`) next to the printable schema; that SDL is the one that carries
/// the entity information and is therefore the one visited.
pub fn configuration<'a>(
    schema: &Document<'a, String>,
    service_sdl: Option<&Document<'a, String>>,
    argument_replacements: &[ArgumentReplacement],
) -> Result<GraphQLConfiguration, ComposeError> {
    let document = service_sdl.unwrap_or(schema);
    let root_types = RootTypes::from_document(document);
    let mut visitor = ConfigurationVisitor::new(root_types, argument_replacements);
    walk_document(document, &mut visitor)?;

    let config = visitor.config;
    debug!(
        root_nodes = config.root_nodes.len(),
        child_nodes = config.child_nodes.len(),
        fields = config.fields.len(),
        "classified schema fields"
    );
    Ok(config)
}

struct ConfigurationVisitor<'r> {
    root_types: RootTypes,
    argument_replacements: &'r [ArgumentReplacement],
    config: GraphQLConfiguration,
    type_name: Option<String>,
    field_name: Option<String>,
    is_extension_type: bool,
    has_extension_directive: bool,
    is_entity: bool,
    is_external_field: bool,
    entity_fields: Vec<String>,
}

impl<'r> ConfigurationVisitor<'r> {
    fn new(root_types: RootTypes, argument_replacements: &'r [ArgumentReplacement]) -> Self {
        ConfigurationVisitor {
            root_types,
            argument_replacements,
            config: GraphQLConfiguration::default(),
            type_name: None,
            field_name: None,
            is_extension_type: false,
            has_extension_directive: false,
            is_entity: false,
            is_external_field: false,
            entity_fields: Vec::new(),
        }
    }

    fn enter_type(&mut self, name: &str, is_extension_type: bool) {
        self.type_name = Some(name.to_owned());
        self.is_extension_type = is_extension_type;
        self.is_entity = false;
    }

    fn leave_type(&mut self) {
        self.type_name = None;
        self.is_extension_type = false;
        self.has_extension_directive = false;
        self.is_entity = false;
        self.entity_fields.clear();
    }

    fn enter_directive(
        &mut self,
        directive: &graphql_parser::schema::Directive<String>,
    ) -> Result<(), ComposeError> {
        let on_field = self.field_name.is_some();

        match directive.name.as_str() {
            "extends" if !on_field => self.has_extension_directive = true,
            "key" if !on_field => {
                self.is_entity = true;
                if let Some(fields) = string_argument(directive, "fields") {
                    let selection = parse_selection_set(fields)?;
                    self.entity_fields
                        .extend(selection.field_names().map(str::to_owned));
                }
            }
            "external" if on_field => self.is_external_field = true,
            _ => (),
        }

        Ok(())
    }

    fn leave_field(&mut self) {
        let (type_name, field_name) = match (self.type_name.clone(), self.field_name.take()) {
            (Some(type_name), Some(field_name)) => (type_name, field_name),
            _ => return,
        };

        let is_root = self.root_types.status(&type_name).is_root();
        let is_external = self.is_external_field;
        let is_extension = self.is_extension_type || self.has_extension_directive;
        let is_federation_root_node = is_extension && self.is_entity && !is_external;
        let is_entity_field = self.entity_fields.iter().any(|f| *f == field_name);
        let entity_fields = self.entity_fields.clone();
        let config = &mut self.config;

        if is_root {
            add_type_field(&mut config.root_nodes, &type_name, &field_name);
        }

        // entities are resolvable on their own through their key
        if self.is_entity && !is_external {
            add_type_field(&mut config.root_nodes, &type_name, &field_name);
        }

        if is_federation_root_node {
            add_type_field(&mut config.root_nodes, &type_name, &field_name);
            config.add_required_fields(&type_name, &field_name, &entity_fields);
        }

        if !is_root && !is_federation_root_node && !is_external {
            add_type_field(&mut config.child_nodes, &type_name, &field_name);
        }

        // external key fields are fetched first, then resolved locally
        if is_external && is_entity_field {
            add_type_field(&mut config.child_nodes, &type_name, &field_name);
        }

        if self.is_entity && !is_entity_field && !is_external && !is_federation_root_node {
            config.add_required_fields(&type_name, &field_name, &entity_fields);
        }

        self.is_external_field = false;
    }
}

impl<'r> Visitor for ConfigurationVisitor<'r> {
    fn enter(&mut self, node: Node) -> Result<(), ComposeError> {
        match node {
            Node::ObjectType(object) => self.enter_type(&object.name, false),
            Node::InterfaceType(interface) => self.enter_type(&interface.name, false),
            Node::ObjectTypeExtension(object) => self.enter_type(&object.name, true),
            Node::InterfaceTypeExtension(interface) => self.enter_type(&interface.name, true),
            Node::Directive(directive) => self.enter_directive(directive)?,
            Node::FieldDefinition(field) => self.field_name = Some(field.name.clone()),
            Node::InputValueDefinition(argument) => {
                if let (Some(type_name), Some(field_name)) = (&self.type_name, &self.field_name) {
                    self.config.add_field_argument(
                        type_name,
                        field_name,
                        &argument.name,
                        self.argument_replacements,
                    );
                }
            }
        }

        Ok(())
    }

    fn leave(&mut self, node: Node) -> Result<(), ComposeError> {
        match node {
            Node::ObjectType(_)
            | Node::InterfaceType(_)
            | Node::ObjectTypeExtension(_)
            | Node::InterfaceTypeExtension(_) => self.leave_type(),
            Node::FieldDefinition(_) => self.leave_field(),
            Node::Directive(_) | Node::InputValueDefinition(_) => (),
        }

        Ok(())
    }
}
