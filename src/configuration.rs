//! The records handed to the execution engine: which (type, field) pairs each
//! data source resolves, and the per-field and per-type augmentations it needs.

/// A type and the fields it exposes at one classification level (root or child).
///
/// `field_names` behaves as an insertion-ordered set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeField {
    pub type_name: String,
    pub field_names: Vec<String>,
}

impl TypeField {
    pub fn new(type_name: impl Into<String>) -> TypeField {
        TypeField {
            type_name: type_name.into(),
            field_names: Vec::new(),
        }
    }

    pub fn with_fields<I, S>(type_name: impl Into<String>, fields: I) -> TypeField
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut type_field = TypeField::new(type_name);
        for field in fields {
            type_field.add_field(field);
        }
        type_field
    }

    /// Appends `field_name` unless it is already listed.
    pub fn add_field(&mut self, field_name: impl Into<String>) {
        let field_name = field_name.into();
        if !self.field_names.contains(&field_name) {
            self.field_names.push(field_name);
        }
    }

    pub fn has_field(&self, field_name: &str) -> bool {
        self.field_names.iter().any(|f| f == field_name)
    }
}

/// Inserts `field_name` under `type_name`, creating the type entry on first use.
pub fn add_type_field(type_fields: &mut Vec<TypeField>, type_name: &str, field_name: &str) {
    match type_fields.iter_mut().find(|t| t.type_name == type_name) {
        Some(type_field) => type_field.add_field(field_name),
        None => type_fields.push(TypeField::with_fields(type_name, Some(field_name))),
    }
}

/// A field singled out by type and name, e.g. a JSON column of a database table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleTypeField {
    pub type_name: String,
    pub field_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArgumentSource {
    FieldArgument,
    ObjectField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArgumentRenderConfiguration {
    RenderArgumentDefault,
    RenderArgumentAsGraphqlValue,
    RenderArgumentAsArrayCsv,
}

impl Default for ArgumentRenderConfiguration {
    fn default() -> Self {
        ArgumentRenderConfiguration::RenderArgumentDefault
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentConfiguration {
    pub name: String,
    pub source_type: ArgumentSource,
    /// Only meaningful for `ArgumentSource::ObjectField`.
    pub source_path: Vec<String>,
    pub render_configuration: ArgumentRenderConfiguration,
    pub rename_type_to: String,
}

impl ArgumentConfiguration {
    pub fn field_argument(name: impl Into<String>) -> ArgumentConfiguration {
        ArgumentConfiguration {
            name: name.into(),
            source_type: ArgumentSource::FieldArgument,
            source_path: Vec::new(),
            render_configuration: ArgumentRenderConfiguration::default(),
            rename_type_to: String::new(),
        }
    }

    pub fn object_field<I, S>(name: impl Into<String>, source_path: I) -> ArgumentConfiguration
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArgumentConfiguration {
            name: name.into(),
            source_type: ArgumentSource::ObjectField,
            source_path: source_path.into_iter().map(Into::into).collect(),
            render_configuration: ArgumentRenderConfiguration::default(),
            rename_type_to: String::new(),
        }
    }
}

/// Augmentation for a single (type, field) pair. There is at most one per pair,
/// and at most one argument configuration per argument name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfiguration {
    pub type_name: String,
    pub field_name: String,
    pub disable_default_field_mapping: bool,
    pub path: Vec<String>,
    pub arguments_configuration: Vec<ArgumentConfiguration>,
    pub requires_fields: Vec<String>,
    pub unescape_response_json: bool,
}

impl FieldConfiguration {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> FieldConfiguration {
        FieldConfiguration {
            type_name: type_name.into(),
            field_name: field_name.into(),
            ..FieldConfiguration::default()
        }
    }

    pub fn is(&self, type_name: &str, field_name: &str) -> bool {
        self.type_name == type_name && self.field_name == field_name
    }

    /// Replaces the argument with the same name, or appends it.
    pub fn upsert_argument(&mut self, argument: ArgumentConfiguration) {
        match self
            .arguments_configuration
            .iter_mut()
            .find(|a| a.name == argument.name)
        {
            Some(existing) => *existing = argument,
            None => self.arguments_configuration.push(argument),
        }
    }

    pub fn add_required_field(&mut self, required: &str) {
        if !self.requires_fields.iter().any(|f| f == required) {
            self.requires_fields.push(required.to_owned());
        }
    }
}

/// Finds the configuration for (`type_name`, `field_name`), creating an empty one if needed.
pub fn field_configuration_mut<'a>(
    fields: &'a mut Vec<FieldConfiguration>,
    type_name: &str,
    field_name: &str,
) -> &'a mut FieldConfiguration {
    let index = match fields.iter().position(|f| f.is(type_name, field_name)) {
        Some(index) => index,
        None => {
            fields.push(FieldConfiguration::new(type_name, field_name));
            fields.len() - 1
        }
    };
    &mut fields[index]
}

/// Folds `other` into `fields`, keeping one configuration per (type, field) pair.
/// Arguments and required fields are unioned; a later argument with the same
/// name wins.
pub fn merge_field_configurations(
    fields: &mut Vec<FieldConfiguration>,
    other: Vec<FieldConfiguration>,
) {
    for field in other {
        let target = field_configuration_mut(fields, &field.type_name, &field.field_name);
        target.disable_default_field_mapping |= field.disable_default_field_mapping;
        target.unescape_response_json |= field.unescape_response_json;
        if target.path.is_empty() {
            target.path = field.path;
        }
        for argument in field.arguments_configuration {
            target.upsert_argument(argument);
        }
        for required in field.requires_fields.iter() {
            target.add_required_field(required);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeConfiguration {
    pub type_name: String,
    pub rename_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveConfiguration {
    pub directive_name: String,
    pub rename_to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceKind {
    Static,
    Rest,
    #[serde(rename = "GRAPHQL")]
    GraphQL,
    Postgresql,
    Mysql,
    Sqlserver,
    Mongodb,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigurationVariableKind {
    StaticConfigurationVariable,
    EnvConfigurationVariable,
    PlaceholderConfigurationVariable,
}

/// A value resolved by the execution engine at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationVariable {
    pub kind: ConfigurationVariableKind,
    pub static_variable_content: String,
    pub environment_variable_name: String,
    pub environment_variable_default_value: String,
    pub placeholder_variable_name: String,
}

impl Default for ConfigurationVariable {
    fn default() -> Self {
        ConfigurationVariable::static_value("")
    }
}

impl ConfigurationVariable {
    pub fn static_value(content: impl Into<String>) -> ConfigurationVariable {
        ConfigurationVariable {
            kind: ConfigurationVariableKind::StaticConfigurationVariable,
            static_variable_content: content.into(),
            environment_variable_name: String::new(),
            environment_variable_default_value: String::new(),
            placeholder_variable_name: String::new(),
        }
    }

    pub fn environment(name: impl Into<String>, default: Option<String>) -> ConfigurationVariable {
        ConfigurationVariable {
            kind: ConfigurationVariableKind::EnvConfigurationVariable,
            static_variable_content: String::new(),
            environment_variable_name: name.into(),
            environment_variable_default_value: default.unwrap_or_default(),
            placeholder_variable_name: String::new(),
        }
    }
}

/// A user supplied value: either a literal or the name of an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputVariable {
    Static(String),
    Env {
        env: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
}

impl From<&str> for InputVariable {
    fn from(value: &str) -> InputVariable {
        InputVariable::Static(value.to_owned())
    }
}

impl InputVariable {
    /// The value at introspection time. `None` when the environment variable is
    /// unset and has no default.
    pub fn resolve(&self) -> Option<String> {
        match self {
            InputVariable::Static(content) => Some(content.clone()),
            InputVariable::Env { env, default } => {
                std::env::var(env).ok().or_else(|| default.clone())
            }
        }
    }
}

pub fn map_input_variable(variable: &InputVariable) -> ConfigurationVariable {
    match variable {
        InputVariable::Static(content) => ConfigurationVariable::static_value(content.as_str()),
        InputVariable::Env { env, default } => {
            ConfigurationVariable::environment(env.as_str(), default.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_type_field_is_idempotent() {
        let mut type_fields = Vec::new();
        add_type_field(&mut type_fields, "Query", "hello");
        add_type_field(&mut type_fields, "Query", "hello");
        add_type_field(&mut type_fields, "Query", "world");
        add_type_field(&mut type_fields, "User", "id");

        assert_eq!(
            type_fields,
            vec![
                TypeField::with_fields("Query", vec!["hello", "world"]),
                TypeField::with_fields("User", vec!["id"]),
            ]
        );
    }

    #[test]
    fn upsert_argument_replaces_by_name() {
        let mut field = FieldConfiguration::new("Query", "user");
        field.upsert_argument(ArgumentConfiguration::field_argument("id"));
        field.upsert_argument(ArgumentConfiguration::field_argument("name"));
        let mut replacement = ArgumentConfiguration::field_argument("id");
        replacement.rename_type_to = "UserId".to_string();
        field.upsert_argument(replacement.clone());

        assert_eq!(field.arguments_configuration.len(), 2);
        assert_eq!(field.arguments_configuration[0], replacement);
    }

    #[test]
    fn input_variables_map_to_configuration_variables() {
        let literal: InputVariable = serde_json::from_str(r#""postgres://localhost""#).unwrap();
        assert_eq!(
            map_input_variable(&literal),
            ConfigurationVariable::static_value("postgres://localhost")
        );

        let env: InputVariable =
            serde_json::from_str(r#"{ "env": "DATABASE_URL", "default": "sqlite://x" }"#).unwrap();
        let mapped = map_input_variable(&env);
        assert_eq!(mapped.kind, ConfigurationVariableKind::EnvConfigurationVariable);
        assert_eq!(mapped.environment_variable_name, "DATABASE_URL");
        assert_eq!(mapped.environment_variable_default_value, "sqlite://x");
    }

    #[test]
    fn resolve_input_variables() {
        assert_eq!(InputVariable::from("literal").resolve(), Some("literal".to_string()));

        let with_default = InputVariable::Env {
            env: "GQL_COMPOSE_TEST_SURELY_UNSET".to_string(),
            default: Some("fallback".to_string()),
        };
        assert_eq!(with_default.resolve(), Some("fallback".to_string()));

        let without_default = InputVariable::Env {
            env: "GQL_COMPOSE_TEST_SURELY_UNSET".to_string(),
            default: None,
        };
        assert_eq!(without_default.resolve(), None);
    }

    #[test]
    fn data_source_kind_serializes_like_the_engine_expects() {
        assert_eq!(
            serde_json::to_string(&DataSourceKind::GraphQL).unwrap(),
            r#""GRAPHQL""#
        );
        assert_eq!(
            serde_json::to_string(&ArgumentSource::ObjectField).unwrap(),
            r#""OBJECT_FIELD""#
        );
    }

    #[test]
    fn merging_keeps_one_configuration_per_field() {
        let mut fields = vec![FieldConfiguration {
            requires_fields: vec!["upc".to_string()],
            ..FieldConfiguration::new("Product", "reviews")
        }];

        merge_field_configurations(
            &mut fields,
            vec![
                FieldConfiguration {
                    requires_fields: vec!["upc".to_string(), "sku".to_string()],
                    arguments_configuration: vec![ArgumentConfiguration::field_argument("first")],
                    ..FieldConfiguration::new("Product", "reviews")
                },
                FieldConfiguration::new("User", "reviews"),
            ],
        );

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].requires_fields, vec!["upc".to_string(), "sku".to_string()]);
        assert_eq!(fields[0].arguments_configuration.len(), 1);
        assert!(fields[1].is("User", "reviews"));
    }
}
