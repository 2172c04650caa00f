//! Field schema normalization.
//!
//! Raw field definitions come in three categories; each is folded into a
//! [`Field`]. Option and iteration maps are rebuilt from scratch on every
//! call, so a normalized field always mirrors the live option set exactly.

use std::collections::BTreeMap;

use ghkit_core::{Field, FieldShape};
use ghkit_gateway::{RawField, RawIteration, RawOption};

use crate::error::SyncError;

/// Normalize a project's raw field list into `name -> Field`.
///
/// Two fields sharing a name is an integrity error, whatever their categories.
pub fn normalize_fields(raw: &[RawField]) -> Result<BTreeMap<String, Field>, SyncError> {
    let mut fields = BTreeMap::new();
    for field in raw {
        let name = field.name();
        if fields.contains_key(name) {
            return Err(SyncError::Integrity(format!(
                "duplicate field name '{name}' in project schema"
            )));
        }
        fields.insert(name.to_string(), normalize_field(field)?);
    }
    Ok(fields)
}

pub fn normalize_field(raw: &RawField) -> Result<Field, SyncError> {
    match raw {
        RawField::Plain { id, data_type, .. } => Ok(Field::plain(id.clone(), data_type.clone())),
        RawField::SingleSelect { id, name, options } => {
            let options = unique_map(
                name,
                "option",
                options.iter().map(|o| (o.name.clone(), o.id.clone())),
            )?;
            Ok(Field::single_select(id.clone(), options))
        }
        RawField::Iteration {
            id,
            name,
            iterations,
        } => {
            let iterations = unique_map(
                name,
                "iteration",
                iterations.iter().map(|i| (i.title.clone(), i.id.clone())),
            )?;
            Ok(Field::iteration(id.clone(), iterations))
        }
    }
}

/// Re-derive the raw shape of a normalized field.
///
/// Options and iterations come back in name order; iteration dates are not
/// part of the normalized form and are left empty.
pub fn denormalize(name: &str, field: &Field) -> RawField {
    match &field.shape {
        FieldShape::Plain { data_type } => RawField::Plain {
            id: field.id.clone(),
            name: name.to_string(),
            data_type: data_type.to_ascii_uppercase(),
        },
        FieldShape::SingleSelect { options } => RawField::SingleSelect {
            id: field.id.clone(),
            name: name.to_string(),
            options: options
                .iter()
                .map(|(name, id)| RawOption {
                    id: id.clone(),
                    name: name.clone(),
                })
                .collect(),
        },
        FieldShape::Iteration { iterations } => RawField::Iteration {
            id: field.id.clone(),
            name: name.to_string(),
            iterations: iterations
                .iter()
                .map(|(title, id)| RawIteration {
                    id: id.clone(),
                    title: title.clone(),
                    start_date: None,
                    duration: None,
                })
                .collect(),
        },
    }
}

fn unique_map(
    field: &str,
    what: &str,
    entries: impl Iterator<Item = (String, String)>,
) -> Result<BTreeMap<String, String>, SyncError> {
    let mut map = BTreeMap::new();
    for (key, id) in entries {
        if map.insert(key.clone(), id).is_some() {
            return Err(SyncError::Integrity(format!(
                "field '{field}' lists {what} '{key}' twice"
            )));
        }
    }
    Ok(map)
}
