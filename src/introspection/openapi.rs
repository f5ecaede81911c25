//! OpenAPI upstreams. The conversion of the document into a GraphQL composite is
//! done by an [`OpenApiConverter`]; this module feeds it and namespaces its output.

use super::{Introspector, UpstreamConfiguration};
use crate::api::{Api, DataSource, RestApiCustom};
use crate::configuration::TypeConfiguration;
use crate::errors::ComposeError;
use crate::namespace::Namespace;
use crate::shared::parse_schema;
use crate::upstream::{HttpUpstream, IntrospectionSettings};
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OpenApiIntrospectionSource {
    /// Path relative to the current directory.
    #[serde(rename_all = "camelCase")]
    File { file_path: PathBuf },
    #[serde(rename_all = "camelCase")]
    String { openapi_spec: String },
    #[serde(rename_all = "camelCase")]
    Object { openapi_spec: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiIntrospection {
    #[serde(flatten)]
    pub upstream: HttpUpstream,
    pub source: OpenApiIntrospectionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub status_code_unions: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_rename_root_fields: Vec<String>,
}

impl OpenApiIntrospection {
    pub fn new(source: OpenApiIntrospectionSource) -> OpenApiIntrospection {
        OpenApiIntrospection {
            upstream: HttpUpstream::default(),
            source,
            base_url: None,
            status_code_unions: false,
            skip_rename_root_fields: Vec::new(),
        }
    }
}

impl UpstreamConfiguration for OpenApiIntrospection {
    const KIND: &'static str = "openapi";

    fn introspection_settings(&self) -> &IntrospectionSettings {
        &self.upstream.introspection_configuration.introspection
    }
}

/// Turns an OpenAPI document into a composite, in upstream (non namespaced) terms.
#[async_trait]
pub trait OpenApiConverter: Send + Sync {
    async fn convert(
        &self,
        openapi_spec: &str,
        introspection: &OpenApiIntrospection,
    ) -> Result<Api<RestApiCustom>, ComposeError>;
}

async fn read_spec(source: &OpenApiIntrospectionSource) -> Result<String, ComposeError> {
    match source {
        OpenApiIntrospectionSource::File { file_path } => {
            Ok(tokio::fs::read_to_string(file_path).await?)
        }
        OpenApiIntrospectionSource::String { openapi_spec } => Ok(openapi_spec.clone()),
        OpenApiIntrospectionSource::Object { openapi_spec } => {
            Ok(serde_json::to_string(openapi_spec)?)
        }
    }
}

pub fn namespace_openapi_api(
    introspection: &OpenApiIntrospection,
    api: Api<RestApiCustom>,
) -> Result<Api<RestApiCustom>, ComposeError> {
    let api_namespace = introspection.upstream.api_namespace.as_ref().map(String::as_str);
    let namespace = Namespace::new(api_namespace)
        .skip_rename_root_fields(introspection.skip_rename_root_fields.clone());
    if namespace.is_empty() {
        return Ok(api);
    }

    let document = parse_schema(&api.schema)?;
    let mut types = namespace.apply_to_type_configurations(&api.types);
    for generated in namespace.type_configurations(&document) {
        if !types.iter().any(|t: &TypeConfiguration| t.type_name == generated.type_name) {
            types.push(generated);
        }
    }

    let data_sources = api
        .data_sources
        .into_iter()
        .map(|data_source| DataSource {
            root_nodes: namespace.apply_to_type_fields(&data_source.root_nodes, &document),
            child_nodes: namespace.apply_to_type_fields(&data_source.child_nodes, &document),
            ..data_source
        })
        .collect();

    Ok(Api {
        default_flush_interval: api.default_flush_interval,
        schema: namespace.apply_to_schema(&api.schema)?,
        data_sources,
        fields: namespace.apply_to_field_configurations(&api.fields, &document),
        types,
        interpolate_variable_definition_as_json: namespace
            .apply_to_type_names(&api.interpolate_variable_definition_as_json),
    })
}

/// File sources are read on every call and never cached, so edits to the file
/// are picked up immediately.
#[tracing::instrument(skip_all, fields(namespace = ?introspection.upstream.api_namespace))]
pub async fn introspect_openapi(
    introspector: &Introspector,
    converter: &dyn OpenApiConverter,
    introspection: &OpenApiIntrospection,
) -> Result<Api<RestApiCustom>, ComposeError> {
    let generate = || async move {
        let spec = read_spec(&introspection.source).await?;
        let api = converter.convert(&spec, introspection).await?;
        namespace_openapi_api(introspection, api)
    };

    match introspection.source {
        OpenApiIntrospectionSource::File { .. } => generate().await,
        OpenApiIntrospectionSource::String { .. } | OpenApiIntrospectionSource::Object { .. } => {
            introspector.introspect_with_cache(introspection, generate).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{DataSourceKind, FieldConfiguration, TypeField};
    use crate::shared::normalize_schema;

    fn converted() -> Api<RestApiCustom> {
        Api::new(
            normalize_schema(
                "type Query { pets: [Pet] } type Pet { id: ID kind: PetKind } \
                 enum PetKind { CAT DOG }",
            )
            .unwrap(),
            vec![DataSource {
                id: None,
                kind: DataSourceKind::Rest,
                root_nodes: vec![TypeField::with_fields("Query", vec!["pets"])],
                child_nodes: vec![TypeField::with_fields("Pet", vec!["id", "kind"])],
                custom: RestApiCustom::default(),
                directives: Vec::new(),
                request_timeout_seconds: 0,
            }],
            vec![FieldConfiguration::new("Query", "pets")],
            vec![TypeConfiguration {
                type_name: "PetKind".to_string(),
                rename_to: "PetKind".to_string(),
            }],
            vec!["PetInput".to_string()],
        )
    }

    #[test]
    fn sources_deserialize_by_kind() {
        let source: OpenApiIntrospectionSource =
            serde_json::from_str(r#"{ "kind": "file", "filePath": "petstore.yaml" }"#).unwrap();
        assert_eq!(
            source,
            OpenApiIntrospectionSource::File {
                file_path: PathBuf::from("petstore.yaml")
            }
        );
    }

    #[test]
    fn without_namespace_the_output_is_untouched() {
        let introspection = OpenApiIntrospection::new(OpenApiIntrospectionSource::String {
            openapi_spec: "{}".to_string(),
        });
        assert_eq!(namespace_openapi_api(&introspection, converted()).unwrap(), converted());
    }

    #[test]
    fn converter_output_is_namespaced() {
        let mut introspection = OpenApiIntrospection::new(OpenApiIntrospectionSource::String {
            openapi_spec: "{}".to_string(),
        });
        introspection.upstream.api_namespace = Some("petstore".to_string());

        let api = namespace_openapi_api(&introspection, converted()).unwrap();

        assert!(api.schema.contains("petstore_pets: [petstore_Pet]"));
        assert_eq!(
            api.data_sources[0].root_nodes[0].field_names,
            vec!["petstore_pets".to_string()]
        );
        assert_eq!(api.data_sources[0].child_nodes[0].type_name, "petstore_Pet");
        assert_eq!(api.fields[0].path, vec!["pets".to_string()]);
        assert_eq!(
            api.interpolate_variable_definition_as_json,
            vec!["petstore_PetInput".to_string()]
        );
        assert_eq!(
            api.types.iter().filter(|t| t.type_name == "petstore_PetKind").count(),
            1
        );
        assert!(api.types.iter().any(|t| t.type_name == "petstore_Pet" && t.rename_to == "Pet"));
    }
}
