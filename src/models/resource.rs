use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i64,
    pub provider_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default, alias = "serviceCategory")]
    pub category: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    /// Price per slot. `None` when the provider has not set one.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl NewResource {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("resource name is required".to_string());
        }
        match self.price {
            Some(p) if !p.is_finite() || p < 0.0 => Err(format!("invalid price: {p}")),
            _ => Ok(()),
        }
    }
}
