use super::{Introspector, UpstreamConfiguration};
use crate::api::*;
use crate::configuration::*;
use crate::errors::ComposeError;
use crate::namespace::Namespace;
use crate::root_types::RootTypes;
use crate::custom_scalars::{replace_custom_scalars, ReplaceCustomScalarTypeField};
use crate::schema_configuration::{configuration, ArgumentReplacement};
use crate::shared::parse_schema;
use crate::upstream::{FetchConfiguration, HttpMethod, HttpUpstream, IntrospectionSettings};
use async_trait::async_trait;
use graphql_parser::schema::Document;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLIntrospection {
    #[serde(flatten)]
    pub upstream: HttpUpstream,
    pub url: InputVariable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<InputVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<InputVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions_url: Option<InputVariable>,
    #[serde(default, rename = "subscriptionsUseSSE")]
    pub subscriptions_use_sse: bool,
    /// SDL used instead of introspecting the upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_schema_from_string: Option<String>,
    /// Appended to the upstream SDL before anything else happens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_extension: Option<String>,
    #[serde(default)]
    pub is_federation: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_rename_root_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace_custom_scalar_type_fields: Vec<ReplaceCustomScalarTypeField>,
}

impl GraphQLIntrospection {
    pub fn new(url: impl Into<String>) -> GraphQLIntrospection {
        GraphQLIntrospection {
            upstream: HttpUpstream::default(),
            url: InputVariable::Static(url.into()),
            base_url: None,
            path: None,
            subscriptions_url: None,
            subscriptions_use_sse: false,
            load_schema_from_string: None,
            schema_extension: None,
            is_federation: false,
            skip_rename_root_fields: Vec::new(),
            replace_custom_scalar_type_fields: Vec::new(),
        }
    }
}

impl UpstreamConfiguration for GraphQLIntrospection {
    const KIND: &'static str = "graphql";

    fn introspection_settings(&self) -> &IntrospectionSettings {
        &self.upstream.introspection_configuration.introspection
    }
}

/// Fetches an upstream's SDL: the introspected schema, or the `_service { sdl }`
/// of a federation subgraph.
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch_schema(
        &self,
        introspection: &GraphQLIntrospection,
    ) -> Result<String, ComposeError>;
}

/// An upstream's SDL with its schema extension and custom scalar replacements
/// applied.
pub(crate) struct PreparedSchema {
    /// The schema as the upstream serves it, extension included.
    pub upstream_schema: String,
    /// The schema exposed by the gateway, before namespacing.
    pub schema: String,
    pub argument_replacements: Vec<ArgumentReplacement>,
}

pub(crate) fn prepare_schema(
    introspection: &GraphQLIntrospection,
    sdl: &str,
) -> Result<PreparedSchema, ComposeError> {
    let mut sdl = sdl.to_owned();
    if let Some(extension) = &introspection.schema_extension {
        sdl.push('\n');
        sdl.push_str(extension);
    }

    let mut document = parse_schema(&sdl)?;
    let upstream_schema = document.to_string();
    let argument_replacements =
        replace_custom_scalars(&mut document, &introspection.replace_custom_scalar_type_fields);

    Ok(PreparedSchema {
        upstream_schema,
        schema: document.to_string(),
        argument_replacements,
    })
}

pub(crate) fn namespace_of(introspection: &GraphQLIntrospection) -> Namespace {
    Namespace::new(introspection.upstream.api_namespace.as_ref().map(String::as_str))
        .skip_rename_root_fields(introspection.skip_rename_root_fields.clone())
}

/// The data source of one upstream, with its nodes namespaced against
/// `composed`, the schema it becomes part of. The field configurations are
/// returned as classified, for the caller to merge and namespace.
pub(crate) fn graphql_data_source(
    introspection: &GraphQLIntrospection,
    prepared: &PreparedSchema,
    namespace: &Namespace,
    composed: &Document<String>,
) -> Result<(DataSource<GraphQLApiCustom>, Vec<FieldConfiguration>), ComposeError> {
    let document = parse_schema(&prepared.schema)?;
    let service_sdl = if introspection.is_federation {
        Some(&document)
    } else {
        None
    };
    let config = configuration(&document, service_sdl, &prepared.argument_replacements)?;

    let url = map_input_variable(&introspection.url);
    let mut fetch =
        FetchConfiguration::for_upstream(url.clone(), HttpMethod::Post, &introspection.upstream)?;
    fetch.base_url = introspection.base_url.as_ref().map(map_input_variable);
    fetch.path = introspection.path.as_ref().map(map_input_variable);

    let custom = GraphQLApiCustom {
        federation: FederationConfiguration {
            enabled: introspection.is_federation,
            service_sdl: if introspection.is_federation {
                prepared.upstream_schema.clone()
            } else {
                String::new()
            },
        },
        fetch,
        subscription: GraphQLSubscriptionConfiguration {
            enabled: RootTypes::from_document(&document).subscription.is_some(),
            url: introspection
                .subscriptions_url
                .as_ref()
                .map(map_input_variable)
                .unwrap_or(url),
            use_sse: introspection.subscriptions_use_sse,
        },
        upstream_schema: prepared.upstream_schema.clone(),
    };

    let configuration = &introspection.upstream.introspection_configuration;
    let data_source = DataSource {
        id: configuration.id.clone(),
        kind: DataSourceKind::GraphQL,
        root_nodes: namespace.apply_to_type_fields(&config.root_nodes, composed),
        child_nodes: namespace.apply_to_type_fields(&config.child_nodes, composed),
        custom,
        directives: Vec::new(),
        request_timeout_seconds: configuration.request_timeout_seconds,
    };

    Ok((data_source, config.fields))
}

/// Builds the composite of a GraphQL upstream from its SDL.
pub fn graphql_api(
    introspection: &GraphQLIntrospection,
    sdl: &str,
) -> Result<Api<GraphQLApiCustom>, ComposeError> {
    let prepared = prepare_schema(introspection, sdl)?;
    let document = parse_schema(&prepared.schema)?;
    let namespace = namespace_of(introspection);
    let (data_source, fields) =
        graphql_data_source(introspection, &prepared, &namespace, &document)?;

    Ok(Api::new(
        namespace.apply_to_schema(&prepared.schema)?,
        vec![data_source],
        namespace.apply_to_field_configurations(&fields, &document),
        namespace.type_configurations(&document),
        Vec::new(),
    ))
}

#[tracing::instrument(skip_all, fields(namespace = ?introspection.upstream.api_namespace))]
pub async fn introspect_graphql(
    introspector: &Introspector,
    fetcher: &dyn SchemaFetcher,
    introspection: &GraphQLIntrospection,
) -> Result<Api<GraphQLApiCustom>, ComposeError> {
    introspector
        .introspect_with_cache(introspection, || async move {
            let sdl = match &introspection.load_schema_from_string {
                Some(sdl) => sdl.clone(),
                None => fetcher.fetch_schema(introspection).await?,
            };
            graphql_api(introspection, &sdl)
        })
        .await
}
