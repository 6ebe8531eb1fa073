use serde::{Deserialize, Serialize};

/// One contract entry from a registry results page.
///
/// Every field is optional, a listing block that is missing a marker simply
/// leaves the field unset. Values are kept exactly as rendered on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
}

impl Contract {
    pub const FIELD_NAMES: [&'static str; 11] = [
        "number",
        "url",
        "status",
        "customer_name",
        "customer_url",
        "contract_identifier",
        "price",
        "conclusion_date",
        "execution_date",
        "publication_date",
        "update_date",
    ];

    fn slots(&self) -> [&Option<String>; 11] {
        [
            &self.number,
            &self.url,
            &self.status,
            &self.customer_name,
            &self.customer_url,
            &self.contract_identifier,
            &self.price,
            &self.conclusion_date,
            &self.execution_date,
            &self.publication_date,
            &self.update_date,
        ]
    }

    /// Returns the fields that are set as `(name, value)` pairs, in declaration order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        Self::FIELD_NAMES
            .iter()
            .zip(self.slots())
            .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v)))
            .collect()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        let idx = Self::FIELD_NAMES.iter().position(|name| *name == field)?;
        self.slots()[idx].as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().iter().all(|v| v.is_none())
    }
}
