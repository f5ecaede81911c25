//! Parsing of the selection-set fragments found in federation directives, such as
//! `@key(fields: "id sku { upc }")`.

use crate::errors::ComposeError;
use graphql_parser::query;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    pub fields: Vec<SelectedField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedField {
    pub name: String,
    pub selection_set: SelectionSet,
}

impl SelectionSet {
    /// Names of the top-level field selections, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn from_query(selection_set: &query::SelectionSet<String>) -> SelectionSet {
        let fields = selection_set
            .items
            .iter()
            .filter_map(|selection| match selection {
                query::Selection::Field(field) => Some(SelectedField {
                    name: field.name.clone(),
                    selection_set: SelectionSet::from_query(&field.selection_set),
                }),
                // fragments are not allowed in field sets
                query::Selection::FragmentSpread(_) | query::Selection::InlineFragment(_) => None,
            })
            .collect();

        SelectionSet { fields }
    }
}

/// Parses a selection set given without its surrounding braces.
pub fn parse_selection_set(fields: &str) -> Result<SelectionSet, ComposeError> {
    let wrapped = format!("{{ {} }}", fields);
    let invalid = |message: String| ComposeError::InvalidSelectionSet {
        selection: fields.to_owned(),
        message,
    };

    let document = query::parse_query::<String>(&wrapped).map_err(|err| invalid(err.to_string()))?;

    match document.definitions.first() {
        Some(query::Definition::Operation(query::OperationDefinition::SelectionSet(
            selection_set,
        ))) => Ok(SelectionSet::from_query(selection_set)),
        _ => Err(invalid("expected a bare selection set".to_owned())),
    }
}

impl fmt::Display for SelectionSet {
    /// Renders the selection without surrounding braces, the way it is written in a directive.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&field.name)?;
            if !field.selection_set.is_empty() {
                write!(f, " {{ {} }}", field.selection_set)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    #[test]
    fn single_key_field() {
        let selection = parse_selection_set("id").unwrap();
        assert_eq!(selection.field_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn compound_and_nested_key() {
        let selection = parse_selection_set("id sku { upc vendor { id } }").unwrap();

        assert_eq!(selection.field_names().collect::<Vec<_>>(), vec!["id", "sku"]);
        assert_eq!(
            selection.fields[1]
                .selection_set
                .field_names()
                .collect::<Vec<_>>(),
            vec!["upc", "vendor"]
        );
        assert_eq!(selection.to_string(), "id sku { upc vendor { id } }");
    }

    #[test]
    fn fragments_are_skipped() {
        let selection = parse_selection_set("id ... on User { name }").unwrap();
        assert_eq!(selection.field_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn invalid_selection() {
        assert_matches!(
            parse_selection_set("id {"),
            Err(ComposeError::InvalidSelectionSet { .. })
        );
    }
}
