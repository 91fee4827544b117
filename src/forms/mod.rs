//! Composite form state: one typed record per flow variant.
//!
//! Records serialize with the camelCase field names the web client uses.
//! Every declared field is always present in a record's snapshot, even when
//! empty or null; fields are reset, never removed.

pub mod cleantech;
pub mod corporate;
pub mod finance;

pub use cleantech::{CleantechForm, Intent};
pub use corporate::{CorporateRegistrationForm, OnboardingChoice, OnboardingChoiceForm};
pub use finance::{
    ContactDetails, EngagementType, FinanceRegistration, InvestorProfile, ParticipantProfile,
    ParticipationIntent, RegistrationForm, RegistrationType, VendorFunding,
};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FlowError;

/// Field name → new value, as sent by the client.
pub type FieldPatch = serde_json::Map<String, Value>;

/// A selected file, described rather than uploaded.
///
/// `url` is a client-local object URL; it is only meaningful for the page
/// lifetime that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
}

/// A flow's accumulated form state.
pub trait FormRecord: Send {
    /// Flat JSON object holding every declared field.
    fn snapshot(&self) -> Value;

    /// Merge field values into the record. Either every field applies or
    /// none does. Returns the names of the touched fields.
    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError>;

    /// Flip `value` in the multi-select `field`. Returns whether the value
    /// is selected afterwards.
    fn toggle(&mut self, field: &str, value: &str) -> Result<bool, FlowError> {
        let snapshot = self.snapshot();
        let current = snapshot.get(field).ok_or_else(|| FlowError::UnknownField {
            field: field.to_string(),
        })?;
        let Some(items) = current.as_array() else {
            return Err(FlowError::InvalidValue {
                field: field.to_string(),
                reason: "not a multi-select field".into(),
            });
        };

        let mut values = items.clone();
        let selected = match values.iter().position(|v| v.as_str() == Some(value)) {
            Some(pos) => {
                values.remove(pos);
                false
            }
            None => {
                values.push(Value::String(value.to_string()));
                true
            }
        };

        let mut patch = FieldPatch::new();
        patch.insert(field.to_string(), Value::Array(values));
        self.apply_patch(&patch)?;
        Ok(selected)
    }
}

/// Serialize a record to its JSON object form.
pub fn to_snapshot<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or_default()
}

/// Merge `patch` into a serde-backed record.
///
/// Unknown fields and values of the wrong shape are rejected with the name
/// of the offending field; the record is only replaced once every field has
/// been accepted.
pub fn merge_fields<T>(record: &mut T, patch: &FieldPatch) -> Result<Vec<String>, FlowError>
where
    T: Serialize + DeserializeOwned,
{
    if patch.is_empty() {
        return Ok(Vec::new());
    }

    let Value::Object(mut fields) = to_snapshot(record) else {
        return Err(FlowError::InvalidValue {
            field: "*".into(),
            reason: "record is not an object".into(),
        });
    };

    for (field, value) in patch {
        let Some(slot) = fields.get_mut(field) else {
            return Err(FlowError::UnknownField {
                field: field.clone(),
            });
        };
        *slot = value.clone();

        if let Err(e) = serde_json::from_value::<T>(Value::Object(fields.clone())) {
            return Err(FlowError::InvalidValue {
                field: field.clone(),
                reason: e.to_string(),
            });
        }
    }

    *record = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        FlowError::InvalidValue {
            field: "*".into(),
            reason: e.to_string(),
        }
    })?;
    Ok(patch.keys().cloned().collect())
}

/// The top-level keys a record serializes with.
pub fn field_names<T: Serialize>(record: &T) -> Vec<String> {
    match to_snapshot(record) {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}
