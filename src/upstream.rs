//! HTTP settings shared by GraphQL and REST upstreams, and their mapping into the
//! fetch configuration carried by data sources.

use crate::configuration::{map_input_variable, ConfigurationVariable, InputVariable};
use crate::errors::ComposeError;
use std::collections::BTreeMap;

/// Per-upstream introspection settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSettings {
    #[serde(default)]
    pub disable_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval_seconds: Option<u64>,
}

/// Fields every introspection configuration carries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionConfiguration {
    /// Unique identifier of the data source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Timeout for requests sent by the data source, enforced by the execution
    /// engine. Zero selects the engine's default.
    #[serde(default)]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub introspection: IntrospectionSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpUpstream {
    #[serde(flatten)]
    pub introspection_configuration: IntrospectionConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_namespace: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, InputVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<HttpUpstreamAuthentication>,
    #[serde(default, rename = "mTLS", skip_serializing_if = "Option::is_none")]
    pub mtls: Option<HttpMtlsConfiguration>,
}

/// Authentication as written by the user. `kind` and `signing_method` are kept
/// as strings and validated when the fetch configuration is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpUpstreamAuthentication {
    pub kind: String,
    pub secret: InputVariable,
    pub signing_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_exchange_endpoint: Option<InputVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMtlsConfiguration {
    /// Private key, or the environment variable holding it.
    pub key: InputVariable,
    /// X.509 certificate, or the environment variable holding it.
    pub cert: InputVariable,
    /// Skips verification of the server's certificate chain and host name.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningMethod {
    #[serde(rename = "SigningMethodHS256")]
    Hs256,
}

impl SigningMethod {
    pub fn parse(signing_method: &str) -> Result<SigningMethod, ComposeError> {
        match signing_method {
            "HS256" => Ok(SigningMethod::Hs256),
            other => Err(ComposeError::unsupported("JWT signing method", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpstreamAuthenticationKind {
    #[serde(rename = "UpstreamAuthenticationJWT")]
    Jwt,
    #[serde(rename = "UpstreamAuthenticationJWTWithAccessTokenExchange")]
    JwtWithAccessTokenExchange,
}

impl UpstreamAuthenticationKind {
    pub fn parse(kind: &str) -> Result<UpstreamAuthenticationKind, ComposeError> {
        match kind {
            "jwt" => Ok(UpstreamAuthenticationKind::Jwt),
            "jwt_with_access_token_exchange" => {
                Ok(UpstreamAuthenticationKind::JwtWithAccessTokenExchange)
            }
            other => Err(ComposeError::unsupported("upstream authentication kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtUpstreamAuthenticationConfig {
    pub secret: ConfigurationVariable,
    pub signing_method: SigningMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtWithAccessTokenExchangeConfig {
    pub access_token_exchange_endpoint: ConfigurationVariable,
    pub secret: ConfigurationVariable,
    pub signing_method: SigningMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamAuthentication {
    pub kind: UpstreamAuthenticationKind,
    pub jwt_config: Option<JwtUpstreamAuthenticationConfig>,
    pub jwt_with_access_token_exchange_config: Option<JwtWithAccessTokenExchangeConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtlsConfiguration {
    pub key: ConfigurationVariable,
    pub cert: ConfigurationVariable,
    pub insecure_skip_verify: bool,
}

pub fn build_upstream_authentication(
    upstream: &HttpUpstream,
) -> Result<Option<UpstreamAuthentication>, ComposeError> {
    let authentication = match &upstream.authentication {
        Some(authentication) => authentication,
        None => return Ok(None),
    };

    let kind = UpstreamAuthenticationKind::parse(&authentication.kind)?;
    let signing_method = SigningMethod::parse(&authentication.signing_method)?;
    let secret = map_input_variable(&authentication.secret);

    let upstream_authentication = match kind {
        UpstreamAuthenticationKind::Jwt => UpstreamAuthentication {
            kind,
            jwt_config: Some(JwtUpstreamAuthenticationConfig { secret, signing_method }),
            jwt_with_access_token_exchange_config: None,
        },
        UpstreamAuthenticationKind::JwtWithAccessTokenExchange => {
            let endpoint = authentication
                .access_token_exchange_endpoint
                .as_ref()
                .ok_or_else(|| {
                    ComposeError::unsupported("access token exchange endpoint", "missing")
                })?;
            UpstreamAuthentication {
                kind,
                jwt_config: None,
                jwt_with_access_token_exchange_config: Some(JwtWithAccessTokenExchangeConfig {
                    access_token_exchange_endpoint: map_input_variable(endpoint),
                    secret,
                    signing_method,
                }),
            }
        }
    };

    Ok(Some(upstream_authentication))
}

pub fn build_mtls_configuration(upstream: &HttpUpstream) -> Option<MtlsConfiguration> {
    upstream.mtls.as_ref().map(|mtls| MtlsConfiguration {
        key: map_input_variable(&mtls.key),
        cert: map_input_variable(&mtls.cert),
        insecure_skip_verify: mtls.insecure_skip_verify,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Post
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderValues {
    pub values: Vec<ConfigurationVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfiguration {
    pub url: ConfigurationVariable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<ConfigurationVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<ConfigurationVariable>,
    pub method: HttpMethod,
    pub header: BTreeMap<String, HeaderValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_authentication: Option<UpstreamAuthentication>,
    #[serde(default, rename = "mTLS", skip_serializing_if = "Option::is_none")]
    pub mtls: Option<MtlsConfiguration>,
    pub url_encode_body: bool,
}

impl FetchConfiguration {
    /// Fetch configuration for `url` carrying the upstream's headers,
    /// authentication and mTLS settings.
    pub fn for_upstream(
        url: ConfigurationVariable,
        method: HttpMethod,
        upstream: &HttpUpstream,
    ) -> Result<FetchConfiguration, ComposeError> {
        let header = upstream
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    HeaderValues {
                        values: vec![map_input_variable(value)],
                    },
                )
            })
            .collect();

        Ok(FetchConfiguration {
            url,
            method,
            header,
            upstream_authentication: build_upstream_authentication(upstream)?,
            mtls: build_mtls_configuration(upstream),
            ..FetchConfiguration::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    fn upstream(kind: &str, signing_method: &str) -> HttpUpstream {
        HttpUpstream {
            authentication: Some(HttpUpstreamAuthentication {
                kind: kind.to_string(),
                secret: InputVariable::Env {
                    env: "JWT_SECRET".to_string(),
                    default: None,
                },
                signing_method: signing_method.to_string(),
                access_token_exchange_endpoint: Some("https://auth.example.com/token".into()),
            }),
            ..HttpUpstream::default()
        }
    }

    #[test]
    fn jwt_authentication() {
        let authentication = build_upstream_authentication(&upstream("jwt", "HS256"))
            .unwrap()
            .unwrap();

        assert_eq!(authentication.kind, UpstreamAuthenticationKind::Jwt);
        let jwt = authentication.jwt_config.unwrap();
        assert_eq!(jwt.secret.environment_variable_name, "JWT_SECRET");
        assert_eq!(jwt.signing_method, SigningMethod::Hs256);
        assert!(authentication.jwt_with_access_token_exchange_config.is_none());
    }

    #[test]
    fn access_token_exchange() {
        let upstream = upstream("jwt_with_access_token_exchange", "HS256");
        let authentication = build_upstream_authentication(&upstream).unwrap().unwrap();

        let config = authentication.jwt_with_access_token_exchange_config.unwrap();
        assert_eq!(
            config.access_token_exchange_endpoint,
            ConfigurationVariable::static_value("https://auth.example.com/token")
        );
    }

    #[test]
    fn unsupported_mappings_are_fatal() {
        assert_matches!(
            build_upstream_authentication(&upstream("basic", "HS256")),
            Err(ComposeError::UnsupportedMapping { .. })
        );
        assert_matches!(
            build_upstream_authentication(&upstream("jwt", "RS256")),
            Err(ComposeError::UnsupportedMapping { .. })
        );
    }

    #[test]
    fn no_authentication() {
        assert_eq!(build_upstream_authentication(&HttpUpstream::default()).unwrap(), None);
        assert_eq!(build_mtls_configuration(&HttpUpstream::default()), None);
    }

    #[test]
    fn fetch_configuration_headers() {
        let mut upstream = HttpUpstream::default();
        upstream
            .headers
            .insert("X-Api-Key".to_string(), InputVariable::Static("secret".to_string()));

        let fetch = FetchConfiguration::for_upstream(
            ConfigurationVariable::static_value("https://api.example.com/graphql"),
            HttpMethod::Post,
            &upstream,
        )
        .unwrap();

        assert_eq!(
            fetch.header["X-Api-Key"].values,
            vec![ConfigurationVariable::static_value("secret")]
        );
        assert_eq!(fetch.method, HttpMethod::Post);
    }
}
