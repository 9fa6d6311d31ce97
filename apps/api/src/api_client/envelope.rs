use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// The `{ status, data }` wrapper every remote endpoint answers with.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<Value>,
}

impl Envelope {
    /// `status` is a bool on some endpoints, an HTTP-like code or a word on
    /// others. A missing status on a 2xx response counts as success.
    pub fn is_success(&self) -> bool {
        match &self.status {
            None | Some(Value::Null) => true,
            Some(Value::Bool(ok)) => *ok,
            Some(Value::Number(code)) => code
                .as_u64()
                .map(|c| (200..300).contains(&c))
                .unwrap_or(false),
            Some(Value::String(word)) => matches!(
                word.trim().to_ascii_lowercase().as_str(),
                "success" | "ok" | "200" | "201"
            ),
            Some(_) => false,
        }
    }

    pub fn message(&self) -> Option<String> {
        match &self.message {
            Some(Value::String(m)) if !m.trim().is_empty() => Some(m.clone()),
            _ => None,
        }
    }

    /// Decodes `data` as a list. A non-array payload yields an empty list and
    /// elements that fail to decode are dropped.
    pub fn into_list<T: DeserializeOwned>(self) -> Vec<T> {
        let Value::Array(items) = self.data else {
            debug!("Envelope data is not an array; treating as empty");
            return Vec::new();
        };

        let total = items.len();
        let decoded: Vec<T> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!("Skipping malformed record: {e}");
                    None
                }
            })
            .collect();

        if decoded.len() < total {
            debug!("Dropped {} of {} records", total - decoded.len(), total);
        }
        decoded
    }

    pub fn into_item<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data)
    }
}
