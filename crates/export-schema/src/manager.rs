//! Schema manager: installs the versioned templates on the backend.
//!
//! Runs once per engine-version upgrade event. Every name it addresses is
//! qualified with its own engine version, so re-running an older version's
//! schema creation after a newer version already installed its templates
//! leaves the newer artifacts untouched.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use export_transport::{ApiRequest, SearchTransport};
use export_types::{IndexConfig, ValueType, OWNED_INDEX_DELIMITER};

use crate::catalog::TemplateCatalog;
use crate::error::SchemaError;

#[derive(Debug, Deserialize)]
struct AcknowledgedResponse {
    #[serde(default)]
    acknowledged: bool,
}

/// Installs index and component templates for one engine version.
pub struct SchemaManager {
    transport: Arc<dyn SearchTransport>,
    catalog: TemplateCatalog,
    index_config: IndexConfig,
    engine_version: String,
}

impl SchemaManager {
    pub fn new(
        transport: Arc<dyn SearchTransport>,
        index_config: IndexConfig,
        engine_version: impl Into<String>,
    ) -> Self {
        let engine_version = engine_version.into();
        Self {
            catalog: TemplateCatalog::new(index_config.clone(), engine_version.clone()),
            transport,
            index_config,
            engine_version,
        }
    }

    /// Name of the index template for a value type:
    /// `<prefix>_<value-type>_<engineVersion>`.
    pub fn index_template_name(&self, value_type: ValueType) -> String {
        format!(
            "{}{}{}{}{}",
            self.index_config.prefix,
            OWNED_INDEX_DELIMITER,
            value_type.as_str(),
            OWNED_INDEX_DELIMITER,
            self.engine_version,
        )
    }

    /// Index pattern the template applies to; the trailing wildcard covers
    /// the daily date suffix.
    pub fn search_pattern(&self, value_type: ValueType) -> String {
        format!(
            "{}{}*",
            self.index_template_name(value_type),
            OWNED_INDEX_DELIMITER
        )
    }

    /// Read alias shared by all of a value type's dated indices.
    pub fn alias_name(&self, value_type: ValueType) -> String {
        format!("{}-{}", self.index_config.prefix, value_type.as_str())
    }

    /// Install this engine version's component template.
    pub async fn put_component_template(&self) -> Result<(), SchemaError> {
        let name = self.catalog.component_template_name();
        let request = self.catalog.build_put_component_template_request(&name)?;
        self.put(&name, request).await?;
        info!(template = %name, "Installed component template");
        Ok(())
    }

    /// Install the index template for one value type, composed of this
    /// engine version's component template.
    pub async fn put_index_template(&self, value_type: ValueType) -> Result<(), SchemaError> {
        let name = self.index_template_name(value_type);
        let request = self.catalog.build_put_index_template_request(
            &name,
            value_type,
            &self.search_pattern(value_type),
            &self.alias_name(value_type),
        )?;
        self.put(&name, request).await?;
        debug!(template = %name, value_type = %value_type, "Installed index template");
        Ok(())
    }

    /// Install the component template and every value type's index
    /// template, in that order: index templates reference the component
    /// template by name and must not be created before it exists.
    pub async fn create_schema(&self) -> Result<(), SchemaError> {
        self.put_component_template().await?;
        for value_type in ValueType::ALL {
            self.put_index_template(*value_type).await?;
        }
        info!(
            engine_version = %self.engine_version,
            templates = ValueType::ALL.len(),
            "Schema created"
        );
        Ok(())
    }

    async fn put(&self, name: &str, request: ApiRequest) -> Result<(), SchemaError> {
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(SchemaError::Put {
                name: name.to_string(),
                reason: format!("status {}: {}", response.status, response.text()),
            });
        }
        let ack: AcknowledgedResponse = response
            .json()
            .map_err(|e| SchemaError::Invalid(e.to_string()))?;
        if !ack.acknowledged {
            return Err(SchemaError::Put {
                name: name.to_string(),
                reason: "not acknowledged".to_string(),
            });
        }
        Ok(())
    }
}
