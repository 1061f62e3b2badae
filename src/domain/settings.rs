//! Snapshot of the companion task app's settings
//!
//! The companion app owns the status vocabulary; marksync only reads it.
//! Every field is optional because the file is written by another program
//! and may be partial, stale, or absent. Defaults are applied where the
//! values are consumed, never at parse time.

use serde::{Deserialize, Serialize};

/// Untrusted settings record, as the companion app serializes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    /// Frontmatter key overrides (only the status key matters here)
    #[serde(default)]
    pub field_mapping: Option<FieldMapping>,

    /// User-defined status vocabulary; replaces the built-in list entirely
    #[serde(default)]
    pub custom_statuses: Option<Vec<StatusDefinition>>,

    /// Status assigned to tasks the user has not classified
    #[serde(default)]
    pub default_task_status: Option<String>,

    /// Extra frontmatter fields the user declared, with their types
    #[serde(default)]
    pub user_fields: Option<Vec<UserField>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDefinition {
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserField {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
}

/// Normalized payload the signature is computed over
///
/// Field order is fixed by the struct, so the JSON form is canonical:
/// equal payloads serialize identically.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignaturePayload {
    status_field: String,
    default_task_status: String,
    custom_statuses: Vec<SignatureStatus>,
    user_fields: Vec<SignatureField>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    value: String,
    is_completed: bool,
}

#[derive(Serialize)]
struct SignatureField {
    key: String,
    #[serde(rename = "type")]
    field_type: String,
}

/// Computes the configuration signature for a settings snapshot
///
/// The signature covers exactly the inputs the status table is derived
/// from: two snapshots with equal signatures resolve to the same table.
/// Absent settings hash to the same signature as an empty snapshot.
pub fn settings_signature(settings: Option<&SettingsSnapshot>) -> String {
    let status_field = settings
        .and_then(|s| s.field_mapping.as_ref())
        .and_then(|m| m.status.as_deref())
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or("status")
        .to_string();

    let default_task_status = settings
        .and_then(|s| s.default_task_status.as_deref())
        .map(str::trim)
        .unwrap_or("")
        .to_string();

    let custom_statuses = settings
        .and_then(|s| s.custom_statuses.as_deref())
        .unwrap_or(&[])
        .iter()
        .map(|def| SignatureStatus {
            value: def.value.as_deref().unwrap_or("").trim().to_string(),
            is_completed: def.is_completed.unwrap_or(false),
        })
        .collect();

    let user_fields = settings
        .and_then(|s| s.user_fields.as_deref())
        .unwrap_or(&[])
        .iter()
        .map(|field| SignatureField {
            key: field.key.as_deref().unwrap_or("").trim().to_string(),
            field_type: field.field_type.as_deref().unwrap_or("").trim().to_string(),
        })
        .collect();

    let payload = SignaturePayload {
        status_field,
        default_task_status,
        custom_statuses,
        user_fields,
    };

    // Serializing a struct of strings and bools cannot fail
    let canonical = serde_json::to_string(&payload).unwrap_or_default();
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}
