//! Database upstreams, introspected by an external engine that reports success or
//! failure per attempt.

use super::{Introspector, UpstreamConfiguration};
use crate::api::{Api, DataSource, DatabaseApiCustom};
use crate::configuration::*;
use crate::custom_scalars::{replace_custom_scalars, ReplaceCustomScalarTypeField};
use crate::errors::ComposeError;
use crate::namespace::Namespace;
use crate::schema_configuration::configuration;
use crate::shared::parse_schema;
use crate::upstream::{IntrospectionConfiguration, IntrospectionSettings};
use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseSchema {
    Postgresql,
    Mysql,
    Planetscale,
    Sqlite,
    Sqlserver,
    Mongodb,
}

impl DatabaseSchema {
    pub fn parse(provider: &str) -> Result<DatabaseSchema, ComposeError> {
        match provider {
            "postgresql" => Ok(DatabaseSchema::Postgresql),
            "mysql" => Ok(DatabaseSchema::Mysql),
            "planetscale" => Ok(DatabaseSchema::Planetscale),
            "sqlite" => Ok(DatabaseSchema::Sqlite),
            "sqlserver" => Ok(DatabaseSchema::Sqlserver),
            "mongodb" => Ok(DatabaseSchema::Mongodb),
            other => Err(ComposeError::unsupported("database schema", other)),
        }
    }

    /// Planetscale speaks the MySQL protocol.
    pub fn data_source_kind(self) -> DataSourceKind {
        match self {
            DatabaseSchema::Postgresql => DataSourceKind::Postgresql,
            DatabaseSchema::Mysql | DatabaseSchema::Planetscale => DataSourceKind::Mysql,
            DatabaseSchema::Sqlite => DataSourceKind::Sqlite,
            DatabaseSchema::Sqlserver => DataSourceKind::Sqlserver,
            DatabaseSchema::Mongodb => DataSourceKind::Mongodb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseIntrospection {
    #[serde(flatten)]
    pub introspection_configuration: IntrospectionConfiguration,
    pub database_schema: DatabaseSchema,
    #[serde(rename = "databaseURL")]
    pub database_url: InputVariable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_rename_root_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace_custom_scalar_type_fields: Vec<ReplaceCustomScalarTypeField>,
}

impl DatabaseIntrospection {
    pub fn new(
        database_schema: DatabaseSchema,
        database_url: InputVariable,
    ) -> DatabaseIntrospection {
        DatabaseIntrospection {
            introspection_configuration: IntrospectionConfiguration::default(),
            database_schema,
            database_url,
            api_namespace: None,
            skip_rename_root_fields: Vec::new(),
            schema_extension: None,
            replace_custom_scalar_type_fields: Vec::new(),
        }
    }
}

impl UpstreamConfiguration for DatabaseIntrospection {
    const KIND: &'static str = "database";

    fn introspection_settings(&self) -> &IntrospectionSettings {
        &self.introspection_configuration.introspection
    }
}

/// What the introspection engine reports for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseIntrospectionResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub graphql_schema: String,
    #[serde(default)]
    pub prisma_schema: String,
    #[serde(default, rename = "interpolateVariableDefinitionAsJSON")]
    pub interpolate_variable_definition_as_json: Vec<String>,
    #[serde(default, rename = "jsonTypeFields")]
    pub json_type_fields: Vec<SingleTypeField>,
    #[serde(default, rename = "jsonResponseFields")]
    pub json_response_fields: Vec<SingleTypeField>,
}

#[async_trait]
pub trait DatabaseIntrospector: Send + Sync {
    async fn introspect(
        &self,
        database_schema: DatabaseSchema,
        database_url: &str,
    ) -> DatabaseIntrospectionResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Calls the engine until an attempt succeeds or `policy.max_attempts` attempts
/// failed. The error carries the message of the last failed attempt.
pub async fn introspect_with_retries(
    engine: &dyn DatabaseIntrospector,
    database_schema: DatabaseSchema,
    database_url: &str,
    policy: RetryPolicy,
) -> Result<DatabaseIntrospectionResult, ComposeError> {
    let attempt = || async move {
        let result = engine.introspect(database_schema, database_url).await;
        if result.success {
            Ok(result)
        } else {
            Err(ComposeError::introspection_failed(result.message))
        }
    };

    let backoff = ConstantBuilder::default()
        .with_delay(policy.delay)
        .with_max_times(policy.max_attempts.saturating_sub(1));

    attempt
        .retry(backoff)
        .notify(|err: &ComposeError, dur: Duration| {
            warn!(
                error = %err,
                "database introspection failed, retrying in {:.1}s",
                dur.as_secs_f32()
            );
        })
        .await
}

/// Builds the composite from a successful engine result: one data source per
/// root field, JSON fields marked for unescaping, everything namespaced.
pub fn database_api(
    introspection: &DatabaseIntrospection,
    result: DatabaseIntrospectionResult,
) -> Result<Api<DatabaseApiCustom>, ComposeError> {
    let mut sdl = result.graphql_schema;
    if let Some(extension) = &introspection.schema_extension {
        sdl.push('\n');
        sdl.push_str(extension);
    }

    let mut document = parse_schema(&sdl)?;
    let upstream_schema = document.to_string();
    let argument_replacements =
        replace_custom_scalars(&mut document, &introspection.replace_custom_scalar_type_fields);
    let schema = document.to_string();
    let config = configuration(&document, None, &argument_replacements)?;

    let mut fields = config.fields;
    for json_field in result
        .json_type_fields
        .iter()
        .chain(result.json_response_fields.iter())
    {
        let field =
            field_configuration_mut(&mut fields, &json_field.type_name, &json_field.field_name);
        field.unescape_response_json = true;
    }

    let namespace = Namespace::new(introspection.api_namespace.as_ref().map(String::as_str))
        .skip_rename_root_fields(introspection.skip_rename_root_fields.clone());

    let custom = DatabaseApiCustom {
        prisma_schema: result.prisma_schema,
        graphql_schema: upstream_schema.clone(),
        database_url: map_input_variable(&introspection.database_url),
        json_type_fields: namespace.apply_to_single_type_fields(&result.json_type_fields),
        json_input_variables: namespace
            .apply_to_type_names(&result.interpolate_variable_definition_as_json),
    };

    let child_nodes = namespace.apply_to_type_fields(&config.child_nodes, &document);
    let kind = introspection.database_schema.data_source_kind();
    let data_sources = config
        .root_nodes
        .iter()
        .flat_map(|root_node| {
            root_node
                .field_names
                .iter()
                .map(move |field_name| {
                    TypeField::with_fields(root_node.type_name.as_str(), Some(field_name.as_str()))
                })
        })
        .map(|root_node| DataSource {
            id: introspection.introspection_configuration.id.clone(),
            kind,
            root_nodes: namespace.apply_to_type_fields(&[root_node], &document),
            child_nodes: child_nodes.clone(),
            custom: custom.clone(),
            directives: Vec::new(),
            request_timeout_seconds: introspection
                .introspection_configuration
                .request_timeout_seconds,
        })
        .collect::<Vec<_>>();

    debug!(
        data_sources = data_sources.len(),
        namespace = ?namespace.name(),
        "built database api"
    );

    Ok(Api::new(
        namespace.apply_to_schema(&schema)?,
        data_sources,
        namespace.apply_to_field_configurations(&fields, &document),
        namespace.type_configurations(&document),
        namespace.apply_to_type_names(&result.interpolate_variable_definition_as_json),
    ))
}

#[tracing::instrument(skip_all, fields(schema = ?introspection.database_schema))]
pub async fn introspect_database(
    introspector: &Introspector,
    engine: &dyn DatabaseIntrospector,
    introspection: &DatabaseIntrospection,
    policy: RetryPolicy,
) -> Result<Api<DatabaseApiCustom>, ComposeError> {
    introspector
        .introspect_with_cache(introspection, || async move {
            let database_url = introspection.database_url.resolve().ok_or_else(|| {
                ComposeError::introspection_failed(
                    "database URL is not set: environment variable missing",
                )
            })?;
            let schema = introspection.database_schema;
            let result = introspect_with_retries(engine, schema, &database_url, policy).await?;
            database_api(introspection, result)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    const SCHEMA: &str = r#"
        type Query { findManyUsers: [User] findFirstUser(id: Int): User }
        type Mutation { createOneUser(name: String): User }
        type User { id: Int name: String meta: Json }
        scalar Json
    "#;

    fn success() -> DatabaseIntrospectionResult {
        DatabaseIntrospectionResult {
            success: true,
            graphql_schema: SCHEMA.to_string(),
            prisma_schema: "model User { id Int @id }".to_string(),
            json_type_fields: vec![SingleTypeField {
                type_name: "User".to_string(),
                field_name: "meta".to_string(),
            }],
            interpolate_variable_definition_as_json: vec!["Json".to_string()],
            ..DatabaseIntrospectionResult::default()
        }
    }

    fn postgres() -> DatabaseIntrospection {
        DatabaseIntrospection::new(DatabaseSchema::Postgresql, "postgres://localhost".into())
    }

    #[test]
    fn providers() {
        assert_eq!(
            DatabaseSchema::parse("planetscale").unwrap().data_source_kind(),
            DataSourceKind::Mysql
        );
        assert_eq!(
            DatabaseSchema::parse("postgresql").unwrap().data_source_kind(),
            DataSourceKind::Postgresql
        );
        assert_matches!(
            DatabaseSchema::parse("oracle"),
            Err(ComposeError::UnsupportedMapping { .. })
        );
    }

    #[test]
    fn one_data_source_per_root_field() {
        let introspection = postgres();
        let api = database_api(&introspection, success()).unwrap();

        let roots: Vec<_> = api
            .data_sources
            .iter()
            .map(|ds| {
                let root_node = &ds.root_nodes[0];
                (root_node.type_name.as_str(), root_node.field_names.clone())
            })
            .collect();
        assert_eq!(
            roots,
            vec![
                ("Query", vec!["findManyUsers".to_string()]),
                ("Query", vec!["findFirstUser".to_string()]),
                ("Mutation", vec!["createOneUser".to_string()]),
            ]
        );
        assert!(api.data_sources.iter().all(|ds| ds.kind == DataSourceKind::Postgresql));
        let child_nodes = &api.data_sources[0].child_nodes;
        assert!(api.data_sources.iter().all(|ds| ds.child_nodes == *child_nodes));
    }

    #[test]
    fn json_fields_are_unescaped() {
        let introspection = postgres();
        let api = database_api(&introspection, success()).unwrap();

        let meta = api.fields.iter().find(|f| f.is("User", "meta")).unwrap();
        assert!(meta.unescape_response_json);
    }

    #[test]
    fn namespaced_database() {
        let mut introspection = postgres();
        introspection.api_namespace = Some("db".to_string());
        let api = database_api(&introspection, success()).unwrap();

        assert!(api.schema.contains("db_findManyUsers: [db_User]"));
        assert_eq!(api.interpolate_variable_definition_as_json, vec!["db_Json".to_string()]);
        let custom = &api.data_sources[0].custom;
        assert_eq!(custom.json_type_fields[0].type_name, "db_User");
        assert_eq!(custom.json_input_variables, vec!["db_Json".to_string()]);
        assert!(custom.graphql_schema.contains("type User"));
        assert!(api.fields.iter().any(|f| f.is("db_User", "meta") && f.unescape_response_json));
        assert!(api.types.iter().any(|t| t.type_name == "db_User" && t.rename_to == "User"));
    }

    #[test]
    fn json_columns_get_concrete_types() {
        let mut introspection = postgres();
        introspection.schema_extension = Some(
            "type UserMeta { theme: String } input UserMetaInput { theme: String }".to_string(),
        );
        introspection.replace_custom_scalar_type_fields = vec![
            ReplaceCustomScalarTypeField::new("User", "meta", "UserMeta"),
            ReplaceCustomScalarTypeField::new("Mutation", "updateOneUser", "User")
                .with_input_type("UserMetaInput"),
        ];
        let result = DatabaseIntrospectionResult {
            graphql_schema: format!(
                "{} extend type Mutation {{ updateOneUser(meta: Json): User }}",
                SCHEMA
            ),
            ..success()
        };

        let api = database_api(&introspection, result).unwrap();

        assert!(api.schema.contains("meta: UserMeta"));
        assert!(api.schema.contains("updateOneUser(meta: UserMetaInput): User"));
        let update = api.fields.iter().find(|f| f.is("Mutation", "updateOneUser")).unwrap();
        assert_eq!(update.arguments_configuration[0].rename_type_to, "Json");
        assert!(api.data_sources[0].custom.graphql_schema.contains("meta: Json"));
    }
}
