#![forbid(unsafe_code)]

use super::support::{Query, execute, id_at, query_opt, query_rows, query_scalar};
use super::{HistoryTx, LiveResource, SqliteHistoryStore, StoreError};
use hist_core::history::{
    HistoricalResource, MappingType, Property, PropertyDefinition, PropertyMap, PropertyValue,
    PublishTag, merge_property_values, overlay_properties,
};
use hist_core::ids::PropertyDefId;
use rusqlite::{Row, params};
use tracing::{debug, instrument};

impl HistoryTx<'_> {
    /// Effective properties of one historical version, sorted by name.
    #[instrument(
        name = "history::read_properties",
        level = "debug",
        skip(self, resource),
        fields(structure_id = %resource.structure_id, publish_tag = resource.publish_tag)
    )]
    pub fn read_properties(
        &self,
        resource: &HistoricalResource,
    ) -> Result<Vec<Property>, StoreError> {
        let structure_id = resource.structure_id.to_string();
        let structure_tag = query_scalar::<PublishTag, _>(
            self.conn,
            Query::StructurePropertyTag,
            params![
                structure_id,
                MappingType::Structure.code(),
                resource.publish_tag
            ],
        )?;

        let mut merged = PropertyMap::new();
        if let Some(tag) = structure_tag {
            let values = query_rows(
                self.conn,
                Query::PropertiesAtTag,
                params![structure_id, tag],
                property_value_at,
            )?;
            merged = merge_property_values(values)?;
        }

        if structure_tag != Some(resource.publish_tag) {
            let values = query_rows(
                self.conn,
                Query::ResourcePropertiesAtTag,
                params![
                    resource.resource_id.to_string(),
                    MappingType::Resource.code(),
                    resource.publish_tag
                ],
                property_value_at,
            )?;
            overlay_properties(&mut merged, merge_property_values(values)?);
        }

        Ok(merged.into_values().collect())
    }

    /// Archives the non-empty values of `properties`, creating missing definitions.
    #[instrument(
        name = "history::write_properties",
        level = "debug",
        skip(self, resource, properties),
        fields(structure_id = %resource.structure_id)
    )]
    pub fn write_properties(
        &self,
        resource: &LiveResource,
        properties: &[Property],
        publish_tag: PublishTag,
    ) -> Result<(), StoreError> {
        let structure_id = resource.structure_id.to_string();
        let resource_id = resource.resource_id.to_string();

        for property in properties {
            let definition = match self.find_property_definition(&property.name)? {
                Some(definition) => definition,
                None => self.create_property_definition(&property.name)?,
            };
            let def_id = definition.id.to_string();

            let scoped = [
                (
                    &structure_id,
                    MappingType::Structure,
                    property.structure_value.as_deref(),
                ),
                (
                    &resource_id,
                    MappingType::Resource,
                    property.resource_value.as_deref(),
                ),
            ];
            for (mapping_id, mapping_type, value) in scoped {
                let Some(value) = value.filter(|value| !value.is_empty()) else {
                    continue;
                };
                execute(
                    self.conn,
                    Query::InsertProperty,
                    params![
                        structure_id,
                        mapping_id,
                        def_id,
                        mapping_type.code(),
                        value,
                        publish_tag
                    ],
                )?;
            }
        }
        Ok(())
    }

    #[instrument(name = "history::read_property_definition", level = "trace", skip(self))]
    pub fn read_property_definition(&self, name: &str) -> Result<PropertyDefinition, StoreError> {
        self.find_property_definition(name)?
            .ok_or_else(|| StoreError::not_found("property definition", name))
    }

    #[instrument(name = "history::create_property_definition", level = "debug", skip(self))]
    pub fn create_property_definition(&self, name: &str) -> Result<PropertyDefinition, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("property name must not be empty"));
        }
        if self.find_property_definition(name)?.is_some() {
            return Err(StoreError::InvalidInput("property definition already exists"));
        }

        let definition = PropertyDefinition {
            id: PropertyDefId::new(),
            name: name.to_string(),
        };
        execute(
            self.conn,
            Query::InsertPropertyDef,
            params![definition.id.to_string(), definition.name],
        )?;
        debug!(def_id = %definition.id, "property definition created");
        Ok(definition)
    }

    /// Fails with a consistency error while archived values still use the definition.
    #[instrument(name = "history::delete_property_definition", level = "debug", skip(self))]
    pub fn delete_property_definition(&self, name: &str) -> Result<(), StoreError> {
        let definition = self.read_property_definition(name)?;
        let def_id = definition.id.to_string();

        let references =
            query_scalar::<i64, _>(self.conn, Query::PropertyDefReferences, params![def_id])?
                .unwrap_or(0);
        if references > 0 {
            return Err(StoreError::DataConsistency(format!(
                "property definition {name} is still used by {references} archived values"
            )));
        }

        execute(self.conn, Query::DeletePropertyDef, params![def_id])?;
        Ok(())
    }

    fn find_property_definition(&self, name: &str) -> Result<Option<PropertyDefinition>, StoreError> {
        query_opt(
            self.conn,
            Query::PropertyDefByName,
            params![name.trim()],
            |row| {
                Ok(PropertyDefinition {
                    id: id_at(row, 0)?,
                    name: row.get(1)?,
                })
            },
        )
    }
}

fn property_value_at(row: &Row<'_>) -> rusqlite::Result<PropertyValue> {
    let code = row.get::<_, i64>(1)?;
    let mapping_type =
        MappingType::from_code(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(1, code))?;
    Ok(PropertyValue {
        name: row.get(0)?,
        mapping_type,
        value: row.get(2)?,
    })
}

impl SqliteHistoryStore {
    pub fn read_properties(
        &mut self,
        resource: &HistoricalResource,
    ) -> Result<Vec<Property>, StoreError> {
        self.in_transaction(|tx| tx.read_properties(resource))
    }

    pub fn write_properties(
        &mut self,
        resource: &LiveResource,
        properties: &[Property],
        publish_tag: PublishTag,
    ) -> Result<(), StoreError> {
        self.in_transaction(|tx| tx.write_properties(resource, properties, publish_tag))
    }

    pub fn read_property_definition(
        &mut self,
        name: &str,
    ) -> Result<PropertyDefinition, StoreError> {
        self.in_transaction(|tx| tx.read_property_definition(name))
    }

    pub fn create_property_definition(
        &mut self,
        name: &str,
    ) -> Result<PropertyDefinition, StoreError> {
        self.in_transaction(|tx| tx.create_property_definition(name))
    }

    pub fn delete_property_definition(&mut self, name: &str) -> Result<(), StoreError> {
        self.in_transaction(|tx| tx.delete_property_definition(name))
    }
}
