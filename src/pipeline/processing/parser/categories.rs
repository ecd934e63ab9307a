use super::{lenient_string, nullable_vec};
use serde::Deserialize;

/// One element of the secondary categorization array (`gs_final`).
#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub business_name: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub categories: Vec<CategoryLabel>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryLabel {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
}

impl CategoryEntry {
    /// Non-empty label texts in source order, each kept at its first position.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.categories.len());
        for text in self.categories.iter().filter_map(|c| c.text.as_deref()) {
            if !labels.iter().any(|l| l == text) {
                labels.push(text.to_string());
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels_keep_order_and_drop_empty_and_repeats() {
        let entry: CategoryEntry = serde_json::from_value(json!({
            "business_name": "Salon Mitte",
            "categories": [
                { "text": "Friseur" },
                { "text": "" },
                { "id": 7 },
                { "text": "Kosmetik" },
                { "text": "Friseur" }
            ]
        }))
        .unwrap();
        assert_eq!(entry.labels(), vec!["Friseur", "Kosmetik"]);
    }
}
