//! Federated GraphQL: several subgraphs introspected through their service SDL
//! and composed under one namespace, with one data source per subgraph.

use super::graphql::{
    graphql_data_source, prepare_schema, GraphQLIntrospection, PreparedSchema, SchemaFetcher,
};
use super::{Introspector, UpstreamConfiguration};
use crate::api::{Api, GraphQLApiCustom};
use crate::configuration::{merge_field_configurations, InputVariable};
use crate::custom_scalars::ReplaceCustomScalarTypeField;
use crate::errors::ComposeError;
use crate::namespace::Namespace;
use crate::shared::{normalize_schema, parse_schema};
use crate::upstream::{
    HttpMtlsConfiguration, HttpUpstream, HttpUpstreamAuthentication, IntrospectionConfiguration,
    IntrospectionSettings,
};
use futures::future::try_join_all;
use graphql_parser::schema::Document;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLFederationUpstream {
    /// Id of the subgraph's data source. Subgraphs without a name use the id of
    /// the federation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: InputVariable,
    #[serde(default)]
    pub headers: BTreeMap<String, InputVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<HttpUpstreamAuthentication>,
    #[serde(default, rename = "mTLS", skip_serializing_if = "Option::is_none")]
    pub mtls: Option<HttpMtlsConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions_url: Option<InputVariable>,
    #[serde(default, rename = "subscriptionsUseSSE")]
    pub subscriptions_use_sse: bool,
    /// Service SDL used instead of querying `_service { sdl }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_schema_from_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace_custom_scalar_type_fields: Vec<ReplaceCustomScalarTypeField>,
}

impl GraphQLFederationUpstream {
    pub fn new(url: impl Into<String>) -> GraphQLFederationUpstream {
        GraphQLFederationUpstream {
            name: None,
            url: InputVariable::Static(url.into()),
            headers: BTreeMap::new(),
            authentication: None,
            mtls: None,
            subscriptions_url: None,
            subscriptions_use_sse: false,
            load_schema_from_string: None,
            schema_extension: None,
            replace_custom_scalar_type_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLFederationIntrospection {
    #[serde(flatten)]
    pub introspection_configuration: IntrospectionConfiguration,
    pub upstreams: Vec<GraphQLFederationUpstream>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_namespace: Option<String>,
}

impl GraphQLFederationIntrospection {
    pub fn new(upstreams: Vec<GraphQLFederationUpstream>) -> GraphQLFederationIntrospection {
        GraphQLFederationIntrospection {
            introspection_configuration: IntrospectionConfiguration::default(),
            upstreams,
            api_namespace: None,
        }
    }

    /// One federation-enabled GraphQL introspection per subgraph, sharing the
    /// namespace and timeouts of the federation.
    pub fn subgraphs(&self) -> Vec<GraphQLIntrospection> {
        self.upstreams
            .iter()
            .map(|upstream| {
                let mut introspection_configuration = self.introspection_configuration.clone();
                if upstream.name.is_some() {
                    introspection_configuration.id = upstream.name.clone();
                }

                GraphQLIntrospection {
                    url: upstream.url.clone(),
                    upstream: HttpUpstream {
                        introspection_configuration,
                        api_namespace: self.api_namespace.clone(),
                        headers: upstream.headers.clone(),
                        authentication: upstream.authentication.clone(),
                        mtls: upstream.mtls.clone(),
                    },
                    subscriptions_url: upstream.subscriptions_url.clone(),
                    subscriptions_use_sse: upstream.subscriptions_use_sse,
                    load_schema_from_string: upstream.load_schema_from_string.clone(),
                    schema_extension: upstream.schema_extension.clone(),
                    is_federation: true,
                    replace_custom_scalar_type_fields: upstream
                        .replace_custom_scalar_type_fields
                        .clone(),
                    ..GraphQLIntrospection::new(String::new())
                }
            })
            .collect()
    }
}

impl UpstreamConfiguration for GraphQLFederationIntrospection {
    const KIND: &'static str = "graphql-federation";

    fn introspection_settings(&self) -> &IntrospectionSettings {
        &self.introspection_configuration.introspection
    }
}

/// Concatenates the subgraph schemas, dropping definitions an earlier subgraph
/// already declared identically.
fn compose_schemas(schemas: &[PreparedSchema]) -> Result<String, ComposeError> {
    let mut definitions: Vec<String> = Vec::new();
    for prepared in schemas.iter() {
        let document = parse_schema(&prepared.schema)?;
        for definition in document.definitions.iter() {
            let printed = Document {
                definitions: vec![definition.clone()],
            }
            .to_string();
            if !definitions.contains(&printed) {
                definitions.push(printed);
            }
        }
    }

    normalize_schema(&definitions.join("\n"))
}

/// Builds the composite of a federated graph from the service SDL of each
/// subgraph, given in the order of [`GraphQLFederationIntrospection::subgraphs`].
pub fn federation_api(
    federation: &GraphQLFederationIntrospection,
    service_sdls: &[String],
) -> Result<Api<GraphQLApiCustom>, ComposeError> {
    let subgraphs = federation.subgraphs();
    if subgraphs.is_empty() {
        return Err(ComposeError::introspection_failed(
            "a federation needs at least one upstream",
        ));
    }
    if subgraphs.len() != service_sdls.len() {
        return Err(ComposeError::introspection_failed(format!(
            "expected {} service SDLs, got {}",
            subgraphs.len(),
            service_sdls.len()
        )));
    }

    let prepared = subgraphs
        .iter()
        .zip(service_sdls.iter())
        .map(|(subgraph, sdl)| prepare_schema(subgraph, sdl))
        .collect::<Result<Vec<_>, _>>()?;
    let schema = compose_schemas(&prepared)?;
    let composed = parse_schema(&schema)?;
    let namespace = Namespace::new(federation.api_namespace.as_ref().map(String::as_str));

    let mut data_sources = Vec::with_capacity(subgraphs.len());
    let mut fields = Vec::new();
    for (subgraph, prepared) in subgraphs.iter().zip(prepared.iter()) {
        let (data_source, subgraph_fields) =
            graphql_data_source(subgraph, prepared, &namespace, &composed)?;
        data_sources.push(data_source);
        merge_field_configurations(&mut fields, subgraph_fields);
    }

    debug!(
        subgraphs = data_sources.len(),
        namespace = ?namespace.name(),
        "composed federation"
    );

    Ok(Api::new(
        namespace.apply_to_schema(&schema)?,
        data_sources,
        namespace.apply_to_field_configurations(&fields, &composed),
        namespace.type_configurations(&composed),
        Vec::new(),
    ))
}

#[tracing::instrument(skip_all, fields(namespace = ?federation.api_namespace))]
pub async fn introspect_federation(
    introspector: &Introspector,
    fetcher: &dyn SchemaFetcher,
    federation: &GraphQLFederationIntrospection,
) -> Result<Api<GraphQLApiCustom>, ComposeError> {
    introspector
        .introspect_with_cache(federation, || async move {
            let subgraphs = federation.subgraphs();
            let service_sdls = try_join_all(subgraphs.iter().map(|subgraph| async move {
                match &subgraph.load_schema_from_string {
                    Some(sdl) => Ok(sdl.clone()),
                    None => fetcher.fetch_schema(subgraph).await,
                }
            }))
            .await?;
            federation_api(federation, &service_sdls)
        })
        .await
}
