//! Template catalog: embedded versioned definitions and put-request
//! builders.
//!
//! Definitions ship with the crate as JSON resources, one per value type
//! plus one shared component template. Shard and replica counts are
//! overridden from configuration; mappings and analyzer settings pass
//! through unchanged.

use serde_json::{json, Map, Value};

use export_transport::ApiRequest;
use export_types::{IndexConfig, ValueType};

use crate::error::SchemaError;

const COMPONENT_TEMPLATE: &str = include_str!("../resources/component-template.json");

/// Priority applied to created index templates so they win over the
/// backend's built-in catch-all templates.
const INDEX_TEMPLATE_PRIORITY: u64 = 20;

fn index_template_resource(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Deployment => include_str!("../resources/index-templates/deployment.json"),
        ValueType::ProcessInstance => {
            include_str!("../resources/index-templates/process-instance.json")
        }
        ValueType::Job => include_str!("../resources/index-templates/job.json"),
        ValueType::Incident => include_str!("../resources/index-templates/incident.json"),
        ValueType::Variable => include_str!("../resources/index-templates/variable.json"),
        ValueType::Message => include_str!("../resources/index-templates/message.json"),
        ValueType::Timer => include_str!("../resources/index-templates/timer.json"),
        ValueType::DecisionEvaluation => {
            include_str!("../resources/index-templates/decision-evaluation.json")
        }
    }
}

/// A parsed template definition: a version number plus the `template`
/// body (settings/mappings) that goes into the put request.
#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    pub version: u64,
    pub template: Value,
}

/// Reads versioned schema definitions and materializes put-template
/// requests. Stateless besides configuration; safe to share read-only.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    index_config: IndexConfig,
    engine_version: String,
}

impl TemplateCatalog {
    pub fn new(index_config: IndexConfig, engine_version: impl Into<String>) -> Self {
        Self {
            index_config,
            engine_version: engine_version.into(),
        }
    }

    /// Name of this engine version's component template:
    /// `<prefix>-<engineVersion>`.
    ///
    /// Version-qualified so templates of different engine versions never
    /// overwrite each other during a rolling upgrade.
    pub fn component_template_name(&self) -> String {
        format!("{}-{}", self.index_config.prefix, self.engine_version)
    }

    /// Load the shared component template definition with shard and replica
    /// counts overridden from configuration.
    pub fn read_component_template(&self) -> Result<TemplateDefinition, SchemaError> {
        self.read(COMPONENT_TEMPLATE, "component template")
    }

    /// Load the index template definition for a value type, with the same
    /// shard and replica override rule.
    pub fn read_index_template(
        &self,
        value_type: ValueType,
    ) -> Result<TemplateDefinition, SchemaError> {
        self.read(index_template_resource(value_type), value_type.as_str())
    }

    fn read(&self, resource: &str, what: &str) -> Result<TemplateDefinition, SchemaError> {
        let mut root: Value = serde_json::from_str(resource)
            .map_err(|e| SchemaError::Read(format!("{}: {}", what, e)))?;

        let version = root
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| SchemaError::Invalid(format!("{}: missing version", what)))?;
        let mut template = root
            .get_mut("template")
            .map(Value::take)
            .ok_or_else(|| SchemaError::Invalid(format!("{}: missing template body", what)))?;

        self.override_index_settings(&mut template);

        Ok(TemplateDefinition { version, template })
    }

    /// Force `number_of_shards`/`number_of_replicas` to the configured
    /// values, creating the settings path if the definition has none.
    /// Everything else in the settings passes through unchanged.
    fn override_index_settings(&self, template: &mut Value) {
        let settings = ensure_object(template, "settings");
        let index = ensure_object(settings, "index");
        if let Value::Object(map) = index {
            map.insert(
                "number_of_shards".to_string(),
                json!(self.index_config.number_of_shards),
            );
            map.insert(
                "number_of_replicas".to_string(),
                json!(self.index_config.number_of_replicas),
            );
        }
    }

    /// Build the put request for an index template composed of this engine
    /// version's component template.
    pub fn build_put_index_template_request(
        &self,
        name: &str,
        value_type: ValueType,
        search_pattern: &str,
        alias_name: &str,
    ) -> Result<ApiRequest, SchemaError> {
        let definition = self.read_index_template(value_type)?;
        let mut template = definition.template;

        if let Some(map) = template.as_object_mut() {
            map.insert("aliases".to_string(), json!({ (alias_name): {} }));
        }

        let body = json!({
            "version": definition.version,
            "priority": INDEX_TEMPLATE_PRIORITY,
            "composed_of": [self.component_template_name()],
            "index_patterns": [search_pattern],
            "template": template,
        });

        Ok(ApiRequest::put(
            format!("/_index_template/{}", name),
            body.to_string(),
        ))
    }

    /// Build the put request for the component template. Carries only
    /// settings and mappings: component templates exist purely to be
    /// composed into index templates, so no patterns or aliases.
    pub fn build_put_component_template_request(
        &self,
        name: &str,
    ) -> Result<ApiRequest, SchemaError> {
        let definition = self.read_component_template()?;

        let body = json!({
            "version": definition.version,
            "template": definition.template,
        });

        Ok(ApiRequest::put(
            format!("/_component_template/{}", name),
            body.to_string(),
        ))
    }
}

fn ensure_object<'a>(value: &'a mut Value, key: &str) -> &'a mut Value {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    let child = &mut value[key];
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    child
}
