use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A job listing as returned by the backend's relevance endpoints.
///
/// The backend is not consistent about identifier types, so `id` accepts
/// strings and numbers and is normalized to a string. A null or missing id is
/// kept as `None` and such listings never take part in new-listing detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobListing {
    #[serde(default, deserialize_with = "deserialize_listing_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Fixed-price budget; the backend sends it as a JSON number.
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, rename = "publishedDateTime")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub relevance: Option<JobRelevance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRelevance {
    pub score: f64,
    pub category: String,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl JobListing {
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// "500 USD", "500" or `None` when no budget is posted.
    pub fn budget(&self) -> Option<String> {
        let amount = self.amount?;
        Some(match self.currency.as_deref() {
            Some(currency) if !currency.is_empty() => format!("{amount} {currency}"),
            _ => format!("{amount}"),
        })
    }

    pub fn description_or_default(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description available")
    }
}

fn deserialize_listing_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
