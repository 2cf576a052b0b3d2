#![forbid(unsafe_code)]

use super::error::HistoryError;
use super::types::{MappingType, Property, PropertyValue};
use std::collections::BTreeMap;

pub type PropertyMap = BTreeMap<String, Property>;

/// Folds stored values into one property per name.
///
/// Each name may carry one structure value and one resource value; a second value of the
/// same mapping type is a consistency violation.
pub fn merge_property_values<I>(values: I) -> Result<PropertyMap, HistoryError>
where
    I: IntoIterator<Item = PropertyValue>,
{
    let mut out = PropertyMap::new();
    for PropertyValue {
        name,
        mapping_type,
        value,
    } in values
    {
        let property = out
            .entry(name.clone())
            .or_insert_with(|| Property::new(name.clone()));
        let slot = match mapping_type {
            MappingType::Structure => &mut property.structure_value,
            MappingType::Resource => &mut property.resource_value,
        };
        if slot.is_some() {
            return Err(HistoryError::DataConsistency(format!(
                "property '{name}' has more than one {mapping_type:?} value"
            )));
        }
        *slot = Some(value);
    }
    Ok(out)
}

/// Applies newer shared values on top of `base`. Structure values in `base` are kept.
pub fn overlay_properties(base: &mut PropertyMap, newer: PropertyMap) {
    for (name, property) in newer {
        match base.get_mut(&name) {
            Some(existing) => {
                if property.structure_value.is_some() {
                    existing.structure_value = property.structure_value;
                }
                if property.resource_value.is_some() {
                    existing.resource_value = property.resource_value;
                }
            }
            None => {
                base.insert(name, property);
            }
        }
    }
}
