use super::{code_list, lenient_object, lenient_string, nullable_vec};
use serde::Deserialize;

/// One line of the primary directory export (`gsbestand`).
#[derive(Debug, Deserialize)]
pub struct DirectoryLine {
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "verlagsdaten", default, deserialize_with = "lenient_object")]
    pub publisher: Option<PublisherData>,
}

#[derive(Debug, Deserialize)]
pub struct PublisherData {
    #[serde(rename = "kontaktinformationen", default, deserialize_with = "lenient_object")]
    pub contact: Option<ContactBlock>,
    #[serde(rename = "branchenIdListe", default, deserialize_with = "code_list")]
    pub branch_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactBlock {
    #[serde(rename = "adresse", default, deserialize_with = "lenient_object")]
    pub address: Option<AddressBlock>,
    #[serde(rename = "personListe", default, deserialize_with = "nullable_vec")]
    pub persons: Vec<PersonEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AddressBlock {
    #[serde(rename = "postleitzahl", default, deserialize_with = "lenient_string")]
    pub postal_code: Option<String>,
    #[serde(rename = "ortsname", default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

impl DirectoryLine {
    fn contact(&self) -> Option<&ContactBlock> {
        self.publisher.as_ref()?.contact.as_ref()
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.contact()?.address.as_ref()?.postal_code.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.contact()?.address.as_ref()?.city.as_deref()
    }

    /// The business name is the first entry of the person list.
    pub fn business_name(&self) -> Option<&str> {
        self.contact()?.persons.first()?.name.as_deref()
    }

    pub fn branch_ids(&self) -> &[String] {
        self.publisher
            .as_ref()
            .map(|p| p.branch_ids.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_address_and_first_person() {
        let line = json!({
            "_id": "gs-1",
            "verlagsdaten": {
                "kontaktinformationen": {
                    "adresse": { "postleitzahl": "10115", "ortsname": "Berlin" },
                    "personListe": [{ "name": " Salon Mitte " }, { "name": "Inhaberin" }]
                },
                "branchenIdListe": [1234, "5678"]
            },
            "unrelated": { "deep": [1, 2, 3] }
        });
        let parsed: DirectoryLine = serde_json::from_value(line).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("gs-1"));
        assert_eq!(parsed.postal_code(), Some("10115"));
        assert_eq!(parsed.city(), Some("Berlin"));
        assert_eq!(parsed.business_name(), Some("Salon Mitte"));
        assert_eq!(parsed.branch_ids(), ["1234".to_string(), "5678".to_string()]);
    }

    #[test]
    fn absent_blocks_yield_none() {
        let parsed: DirectoryLine = serde_json::from_value(json!({ "_id": "x" })).unwrap();
        assert_eq!(parsed.postal_code(), None);
        assert_eq!(parsed.business_name(), None);
        assert!(parsed.branch_ids().is_empty());
    }

    #[test]
    fn wrong_shaped_fields_read_as_absent() {
        let parsed: DirectoryLine = serde_json::from_value(json!({
            "_id": "gs-2",
            "verlagsdaten": {
                "kontaktinformationen": {
                    "adresse": { "postleitzahl": { "plz": "80331" }, "ortsname": ["Berlin"] },
                    "personListe": [{ "name": { "first": "Salon" } }]
                },
                "branchenIdListe": [{ "id": 1200, "name": "Friseur" }, 4711]
            }
        }))
        .unwrap();
        assert_eq!(parsed.postal_code(), None);
        assert_eq!(parsed.city(), None);
        assert_eq!(parsed.business_name(), None);
        assert_eq!(parsed.branch_ids(), ["4711".to_string()]);

        let parsed: DirectoryLine =
            serde_json::from_value(json!({ "_id": "gs-3", "verlagsdaten": "n/a" })).unwrap();
        assert_eq!(parsed.postal_code(), None);
    }

    #[test]
    fn non_object_line_does_not_conform() {
        assert!(super::super::from_object_line::<DirectoryLine>(b"[1, 2]").is_err());
    }
}
