use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A workstation or laptop, keyed by its asset tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcLaptop {
    pub id: String,
    #[serde(flatten)]
    pub components: PcComponents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motherboard_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headphone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_supply_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_id2: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePcLaptopRequest {
    #[validate(length(min = 1, max = 64, message = "Asset id is required"))]
    pub id: String,
    #[serde(flatten)]
    pub components: PcComponents,
}
