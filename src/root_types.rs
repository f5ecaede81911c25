use graphql_parser::schema::*;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

/// Answer to "is this type a root operation type?".
///
/// `NotFound` means the question does not apply: the type is not declared in the
/// document at all. It is neither a root nor a plain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootTypeStatus {
    Root(OperationType),
    NotRoot,
    NotFound,
}

impl RootTypeStatus {
    pub fn is_root(self) -> bool {
        match self {
            RootTypeStatus::Root(_) => true,
            RootTypeStatus::NotRoot | RootTypeStatus::NotFound => false,
        }
    }
}

/// The root operation types of a schema document and the names it declares.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootTypes {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
    declared: HashSet<String>,
}

impl RootTypes {
    /// Reads root types from the `schema { ... }` definition, falling back to the
    /// conventional `Query`, `Mutation` and `Subscription` names when the document
    /// declares such types.
    pub fn from_document(document: &Document<String>) -> RootTypes {
        let mut declared = HashSet::new();
        let mut schema_definition = None;

        for definition in document.definitions.iter() {
            match definition {
                Definition::SchemaDefinition(schema) => schema_definition = Some(schema),
                Definition::TypeDefinition(type_definition) => {
                    declared.insert(type_definition_name(type_definition).to_owned());
                }
                Definition::TypeExtension(extension) => {
                    declared.insert(type_extension_name(extension).to_owned());
                }
                Definition::DirectiveDefinition(_) => (),
            }
        }

        let conventional = |name: &str| {
            if declared.contains(name) {
                Some(name.to_owned())
            } else {
                None
            }
        };

        let (query, mutation, subscription) = match schema_definition {
            Some(schema) => (
                schema.query.clone(),
                schema.mutation.clone(),
                schema.subscription.clone(),
            ),
            None => (
                conventional("Query"),
                conventional("Mutation"),
                conventional("Subscription"),
            ),
        };

        RootTypes {
            query,
            mutation,
            subscription,
            declared,
        }
    }

    pub fn status(&self, type_name: &str) -> RootTypeStatus {
        let is = |root: &Option<String>| root.as_ref().map(String::as_str) == Some(type_name);

        if is(&self.query) {
            RootTypeStatus::Root(OperationType::Query)
        } else if is(&self.mutation) {
            RootTypeStatus::Root(OperationType::Mutation)
        } else if is(&self.subscription) {
            RootTypeStatus::Root(OperationType::Subscription)
        } else if self.declared.contains(type_name) {
            RootTypeStatus::NotRoot
        } else {
            RootTypeStatus::NotFound
        }
    }

    pub fn is_root(&self, type_name: &str) -> bool {
        self.status(type_name).is_root()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.query
            .iter()
            .chain(self.mutation.iter())
            .chain(self.subscription.iter())
            .map(String::as_str)
    }

    /// Declared type names, in no particular order.
    pub fn declared_types(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }
}

pub fn type_definition_name<'a, 'b>(type_definition: &'b TypeDefinition<'a, String>) -> &'b str {
    match type_definition {
        TypeDefinition::Scalar(scalar) => &scalar.name,
        TypeDefinition::Object(object) => &object.name,
        TypeDefinition::Interface(interface) => &interface.name,
        TypeDefinition::Union(union) => &union.name,
        TypeDefinition::Enum(enm) => &enm.name,
        TypeDefinition::InputObject(input) => &input.name,
    }
}

pub fn type_extension_name<'a, 'b>(extension: &'b TypeExtension<'a, String>) -> &'b str {
    match extension {
        TypeExtension::Scalar(scalar) => &scalar.name,
        TypeExtension::Object(object) => &object.name,
        TypeExtension::Interface(interface) => &interface.name,
        TypeExtension::Union(union) => &union.name,
        TypeExtension::Enum(enm) => &enm.name,
        TypeExtension::InputObject(input) => &input.name,
    }
}
