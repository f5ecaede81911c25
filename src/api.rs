//! The composite handed to the merge stage: one upstream's schema together with
//! the data sources, field configurations and type configurations derived from it.

use crate::configuration::*;
use crate::errors::ComposeError;
use crate::namespace::Namespace;
use crate::rename::*;
use crate::shared::normalize_schema;
use crate::upstream::FetchConfiguration;

pub const DEFAULT_FLUSH_INTERVAL_MILLIS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSource<Custom> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: DataSourceKind,
    pub root_nodes: Vec<TypeField>,
    pub child_nodes: Vec<TypeField>,
    pub custom: Custom,
    pub directives: Vec<DirectiveConfiguration>,
    pub request_timeout_seconds: u64,
}

impl<Custom> DataSource<Custom> {
    pub fn map_custom<U, F>(self, f: F) -> DataSource<U>
    where
        F: FnOnce(Custom) -> U,
    {
        DataSource {
            id: self.id,
            kind: self.kind,
            root_nodes: self.root_nodes,
            child_nodes: self.child_nodes,
            custom: f(self.custom),
            directives: self.directives,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }
}

/// One upstream's contribution to the application.
///
/// The schema text, the nodes of every data source and the field configurations
/// always name the same types and fields: they are only changed together, through
/// the rename operations below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Api<Custom> {
    pub default_flush_interval: u64,
    pub schema: String,
    pub data_sources: Vec<DataSource<Custom>>,
    pub fields: Vec<FieldConfiguration>,
    pub types: Vec<TypeConfiguration>,
    /// Type names whose variables are rendered as JSON.
    #[serde(rename = "interpolateVariableDefinitionAsJSON")]
    pub interpolate_variable_definition_as_json: Vec<String>,
}

impl<Custom: Clone> Api<Custom> {
    pub fn new(
        schema: String,
        data_sources: Vec<DataSource<Custom>>,
        fields: Vec<FieldConfiguration>,
        types: Vec<TypeConfiguration>,
        interpolate_variable_definition_as_json: Vec<String>,
    ) -> Api<Custom> {
        Api {
            default_flush_interval: DEFAULT_FLUSH_INTERVAL_MILLIS,
            schema,
            data_sources,
            fields,
            types,
            interpolate_variable_definition_as_json,
        }
    }

    pub fn renamed_types(&self, renames: &[RenameType]) -> Result<Api<Custom>, ComposeError> {
        let schema = rename_types_in_schema(&self.schema, renames)?;
        let data_sources = self
            .data_sources
            .iter()
            .map(|data_source| DataSource {
                root_nodes: rename_types_in_type_fields(&data_source.root_nodes, renames),
                child_nodes: rename_types_in_type_fields(&data_source.child_nodes, renames),
                ..data_source.clone()
            })
            .collect();

        Ok(Api {
            schema,
            data_sources,
            fields: rename_types_in_field_configurations(&self.fields, renames),
            ..self.clone()
        })
    }

    pub fn renamed_type_fields(
        &self,
        renames: &[RenameTypeField],
    ) -> Result<Api<Custom>, ComposeError> {
        let schema = rename_type_fields_in_schema(&self.schema, renames)?;
        let data_sources = self
            .data_sources
            .iter()
            .map(|data_source| DataSource {
                root_nodes: rename_type_fields_in_type_fields(&data_source.root_nodes, renames),
                child_nodes: rename_type_fields_in_type_fields(&data_source.child_nodes, renames),
                ..data_source.clone()
            })
            .collect();

        Ok(Api {
            schema,
            data_sources,
            fields: rename_type_fields_in_field_configurations(&self.fields, renames),
            ..self.clone()
        })
    }

    /// Applies `renames` to the schema, the data sources and the field
    /// configurations. On error `self` is left as it was.
    pub fn rename_types(&mut self, renames: &[RenameType]) -> Result<(), ComposeError> {
        *self = self.renamed_types(renames)?;
        Ok(())
    }

    /// Applies `renames` to the schema, the data sources and the field
    /// configurations. On error `self` is left as it was.
    pub fn rename_type_fields(&mut self, renames: &[RenameTypeField]) -> Result<(), ComposeError> {
        *self = self.renamed_type_fields(renames)?;
        Ok(())
    }
}

impl<Custom> Api<Custom> {
    pub fn map_custom<U, F>(self, f: F) -> Api<U>
    where
        F: Fn(Custom) -> U,
    {
        Api {
            default_flush_interval: self.default_flush_interval,
            schema: self.schema,
            data_sources: self
                .data_sources
                .into_iter()
                .map(|data_source| data_source.map_custom(&f))
                .collect(),
            fields: self.fields,
            types: self.types,
            interpolate_variable_definition_as_json: self.interpolate_variable_definition_as_json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FederationConfiguration {
    pub enabled: bool,
    #[serde(rename = "ServiceSDL")]
    pub service_sdl: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphQLSubscriptionConfiguration {
    pub enabled: bool,
    #[serde(rename = "URL")]
    pub url: ConfigurationVariable,
    #[serde(rename = "UseSSE")]
    pub use_sse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphQLApiCustom {
    pub federation: FederationConfiguration,
    pub fetch: FetchConfiguration,
    pub subscription: GraphQLSubscriptionConfiguration,
    pub upstream_schema: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriptionConfiguration {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval_millis: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_publish_same_response: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCodeTypeMapping {
    pub status_code: u16,
    pub type_name: String,
    pub inject_status_code_into_body: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestApiCustom {
    pub fetch: FetchConfiguration,
    pub subscription: SubscriptionConfiguration,
    pub default_type_name: String,
    pub status_code_type_mappings: Vec<StatusCodeTypeMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseApiCustom {
    pub prisma_schema: String,
    pub graphql_schema: String,
    #[serde(rename = "databaseURL")]
    pub database_url: ConfigurationVariable,
    #[serde(rename = "jsonTypeFields")]
    pub json_type_fields: Vec<SingleTypeField>,
    #[serde(rename = "jsonInputVariables")]
    pub json_input_variables: Vec<String>,
}

/// Payload of any upstream kind, for collecting composites of different kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamCustom {
    GraphQL(GraphQLApiCustom),
    Rest(RestApiCustom),
    Database(DatabaseApiCustom),
}

impl From<GraphQLApiCustom> for UpstreamCustom {
    fn from(custom: GraphQLApiCustom) -> Self {
        UpstreamCustom::GraphQL(custom)
    }
}

impl From<RestApiCustom> for UpstreamCustom {
    fn from(custom: RestApiCustom) -> Self {
        UpstreamCustom::Rest(custom)
    }
}

impl From<DatabaseApiCustom> for UpstreamCustom {
    fn from(custom: DatabaseApiCustom) -> Self {
        UpstreamCustom::Database(custom)
    }
}

impl<Custom: Into<UpstreamCustom>> Api<Custom> {
    pub fn into_upstream(self) -> Api<UpstreamCustom> {
        self.map_custom(Into::into)
    }
}

/// A composite with a schema and nothing to resolve it, for tests and stubs.
pub fn create_mock_api(
    sdl: &str,
    api_namespace: Option<&str>,
) -> Result<Api<GraphQLApiCustom>, ComposeError> {
    let schema = normalize_schema(sdl)?;
    let schema = Namespace::new(api_namespace).apply_to_schema(&schema)?;
    Ok(Api::new(schema, Vec::new(), Vec::new(), Vec::new(), Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_api() -> Api<GraphQLApiCustom> {
        let schema = normalize_schema(
            r#"
            type Query { user(id: ID!): User }
            type User { id: ID! name: String posts: [Post] }
            type Post { id: ID! }
            "#,
        )
        .unwrap();

        let mut posts = FieldConfiguration::new("User", "posts");
        posts.requires_fields = vec!["id".to_string()];
        posts.arguments_configuration =
            vec![ArgumentConfiguration::object_field("authorId", vec!["id"])];

        Api::new(
            schema,
            vec![DataSource {
                id: None,
                kind: DataSourceKind::GraphQL,
                root_nodes: vec![TypeField::with_fields("Query", vec!["user"])],
                child_nodes: vec![
                    TypeField::with_fields("User", vec!["id", "name", "posts"]),
                    TypeField::with_fields("Post", vec!["id"]),
                ],
                custom: GraphQLApiCustom::default(),
                directives: Vec::new(),
                request_timeout_seconds: 0,
            }],
            vec![FieldConfiguration::new("Query", "user"), posts],
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn rename_types_touches_every_structure() {
        let mut api = user_api();
        api.rename_types(&[RenameType::new("User", "Person")]).unwrap();

        assert!(api.schema.contains("type Person {"));
        assert!(api.schema.contains("user(id: ID!): Person"));
        assert_eq!(api.data_sources[0].child_nodes[0].type_name, "Person");
        assert_eq!(api.data_sources[0].child_nodes[1].type_name, "Post");
        assert_eq!(api.fields[1].type_name, "Person");
        assert_eq!(api.fields[0].type_name, "Query");
    }

    #[test]
    fn rename_type_and_back_is_lossless() {
        let original = user_api();
        let renamed = original
            .renamed_types(&[RenameType::new("User", "Person")])
            .unwrap()
            .renamed_types(&[RenameType::new("Person", "User")])
            .unwrap();

        assert_eq!(renamed, original);
    }

    #[test]
    fn rename_type_fields_touches_every_structure() {
        let mut api = user_api();
        api.rename_type_fields(&[RenameTypeField::new("User", "id", "userId")])
            .unwrap();

        assert!(api.schema.contains("userId: ID!"));
        assert_eq!(
            api.data_sources[0].child_nodes[0].field_names,
            vec!["userId".to_string(), "name".to_string(), "posts".to_string()]
        );
        assert_eq!(api.data_sources[0].child_nodes[1].field_names, vec!["id".to_string()]);
        assert_eq!(api.fields[1].requires_fields, vec!["userId".to_string()]);
        assert_eq!(
            api.fields[1].arguments_configuration[0].source_path,
            vec!["userId".to_string()]
        );
    }

    #[test]
    fn failed_rename_leaves_api_untouched() {
        let mut api = user_api();
        api.schema = "type Query {".to_string();
        let before = api.clone();

        assert!(api.rename_types(&[RenameType::new("User", "Person")]).is_err());
        assert_eq!(api, before);
    }

    #[test]
    fn mock_api() {
        let api = create_mock_api("type Query { hello: String }", Some("mock")).unwrap();

        assert!(api.schema.contains("mock_hello: String"));
        assert!(api.data_sources.is_empty());
        assert_eq!(api.default_flush_interval, DEFAULT_FLUSH_INTERVAL_MILLIS);
    }

    #[test]
    fn serializes_with_engine_keys() {
        let json = serde_json::to_value(&user_api()).unwrap();

        assert!(json.get("Schema").is_some());
        assert!(json.get("interpolateVariableDefinitionAsJSON").is_some());
        assert_eq!(json["DataSources"][0]["Kind"], "GRAPHQL");
        assert_eq!(json["DataSources"][0]["RootNodes"][0]["typeName"], "Query");
    }
}
