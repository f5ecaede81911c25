//! Depth-first walk over the parts of a schema document that carry field
//! definitions.
//!
//! Nodes are visited in document order. For each object or interface type
//! (definition or extension) the visitor sees the type, then its directives, then
//! every field. A field is entered, then its arguments (each with its own
//! directives), then the field's directives, and finally left.

use crate::errors::ComposeError;
use graphql_parser::schema::*;

#[derive(Debug, Clone, Copy)]
pub enum Node<'d, 'a> {
    ObjectType(&'d ObjectType<'a, String>),
    InterfaceType(&'d InterfaceType<'a, String>),
    ObjectTypeExtension(&'d ObjectTypeExtension<'a, String>),
    InterfaceTypeExtension(&'d InterfaceTypeExtension<'a, String>),
    Directive(&'d Directive<'a, String>),
    FieldDefinition(&'d Field<'a, String>),
    InputValueDefinition(&'d InputValue<'a, String>),
}

pub trait Visitor {
    fn enter(&mut self, _node: Node<'_, '_>) -> Result<(), ComposeError> {
        Ok(())
    }

    fn leave(&mut self, _node: Node<'_, '_>) -> Result<(), ComposeError> {
        Ok(())
    }
}

pub fn walk_document<V: Visitor>(
    document: &Document<String>,
    visitor: &mut V,
) -> Result<(), ComposeError> {
    for definition in document.definitions.iter() {
        match definition {
            Definition::TypeDefinition(TypeDefinition::Object(object)) => walk_type(
                visitor,
                Node::ObjectType(object),
                &object.directives,
                &object.fields,
            )?,
            Definition::TypeDefinition(TypeDefinition::Interface(interface)) => walk_type(
                visitor,
                Node::InterfaceType(interface),
                &interface.directives,
                &interface.fields,
            )?,
            Definition::TypeExtension(TypeExtension::Object(object)) => walk_type(
                visitor,
                Node::ObjectTypeExtension(object),
                &object.directives,
                &object.fields,
            )?,
            Definition::TypeExtension(TypeExtension::Interface(interface)) => walk_type(
                visitor,
                Node::InterfaceTypeExtension(interface),
                &interface.directives,
                &interface.fields,
            )?,
            _ => (),
        }
    }

    Ok(())
}

fn walk_type<V: Visitor>(
    visitor: &mut V,
    node: Node,
    directives: &[Directive<String>],
    fields: &[Field<String>],
) -> Result<(), ComposeError> {
    visitor.enter(node)?;
    walk_directives(visitor, directives)?;
    for field in fields.iter() {
        walk_field(visitor, field)?;
    }
    visitor.leave(node)
}

fn walk_field<V: Visitor>(visitor: &mut V, field: &Field<String>) -> Result<(), ComposeError> {
    let node = Node::FieldDefinition(field);
    visitor.enter(node)?;
    for argument in field.arguments.iter() {
        let argument_node = Node::InputValueDefinition(argument);
        visitor.enter(argument_node)?;
        walk_directives(visitor, &argument.directives)?;
        visitor.leave(argument_node)?;
    }
    walk_directives(visitor, &field.directives)?;
    visitor.leave(node)
}

fn walk_directives<V: Visitor>(
    visitor: &mut V,
    directives: &[Directive<String>],
) -> Result<(), ComposeError> {
    for directive in directives.iter() {
        visitor.enter(Node::Directive(directive))?;
        visitor.leave(Node::Directive(directive))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::parse_schema;

    #[derive(Default)]
    struct Trace(Vec<String>);

    fn describe(node: Node) -> String {
        match node {
            Node::ObjectType(object) => format!("type {}", object.name),
            Node::InterfaceType(interface) => format!("interface {}", interface.name),
            Node::ObjectTypeExtension(object) => format!("extend type {}", object.name),
            Node::InterfaceTypeExtension(interface) => {
                format!("extend interface {}", interface.name)
            }
            Node::Directive(directive) => format!("@{}", directive.name),
            Node::FieldDefinition(field) => format!("field {}", field.name),
            Node::InputValueDefinition(argument) => format!("arg {}", argument.name),
        }
    }

    impl Visitor for Trace {
        fn enter(&mut self, node: Node) -> Result<(), ComposeError> {
            self.0.push(format!("enter {}", describe(node)));
            Ok(())
        }

        fn leave(&mut self, node: Node) -> Result<(), ComposeError> {
            self.0.push(format!("leave {}", describe(node)));
            Ok(())
        }
    }

    #[test]
    fn visits_in_document_order() {
        let document = parse_schema(
            r#"
            extend type User @key(fields: "id") {
                id: ID! @external
                reviews(first: Int @deprecated): [String]
            }
            input Ignored { a: Int }
            "#,
        )
        .unwrap();
        let mut trace = Trace::default();
        walk_document(&document, &mut trace).unwrap();

        assert_eq!(
            trace.0,
            vec![
                "enter extend type User",
                "enter @key",
                "leave @key",
                "enter field id",
                "enter @external",
                "leave @external",
                "leave field id",
                "enter field reviews",
                "enter arg first",
                "enter @deprecated",
                "leave @deprecated",
                "leave arg first",
                "leave field reviews",
                "leave extend type User",
            ]
        );
    }
}
