use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// WGS84 point. Latitude and longitude only ever travel together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a coordinate only when both components are finite and in range.
    pub fn checked(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }
}

/// A business as it flows through every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,
    pub name: String,
    pub postal_code: String,
    pub city: String,
    pub district: Option<String>,
    pub street_address: Option<String>,
    /// Category labels in source order
    pub categories: Vec<String>,
    /// Classification codes kept for consumers when `categories` is empty
    pub branch_ids: Vec<String>,
    #[serde(flatten, with = "flat_coordinate")]
    pub coordinate: Option<Coordinate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

impl BusinessRecord {
    /// A freshly extracted record: no coordinates and no contact data yet.
    pub fn new(id: String, name: String, postal_code: String, city: String) -> Self {
        Self {
            id,
            name,
            postal_code,
            city,
            district: None,
            street_address: None,
            categories: Vec::new(),
            branch_ids: Vec::new(),
            coordinate: None,
            phone: None,
            email: None,
            website: None,
        }
    }

    pub fn lat(&self) -> Option<f64> {
        self.coordinate.map(|c| c.lat)
    }

    pub fn lon(&self) -> Option<f64> {
        self.coordinate.map(|c| c.lon)
    }
}

/// Fields supplied by the precise source for one business id.
/// `None` means "not supplied", never "clear the stored value".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecisionOverride {
    pub coordinate: Option<Coordinate>,
    pub street_address: Option<String>,
    pub district: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

pub type PrecisionOverrideMap = HashMap<String, PrecisionOverride>;

/// Aggregates recomputed from the store at the end of every build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_businesses: u64,
    pub geocoded_businesses: u64,
    pub unique_postal_codes: u64,
    pub unique_cities: u64,
    pub with_street_address: u64,
    pub with_phone: u64,
    pub with_email: u64,
    pub with_website: u64,
    pub database_version: String,
    pub schema_version: u32,
    pub last_updated: String,
}

/// Serializes `Option<Coordinate>` as two sibling `lat`/`lon` fields.
mod flat_coordinate {
    use super::Coordinate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Flat {
        lat: Option<f64>,
        lon: Option<f64>,
    }

    pub fn serialize<S: Serializer>(value: &Option<Coordinate>, s: S) -> Result<S::Ok, S::Error> {
        Flat {
            lat: value.map(|c| c.lat),
            lon: value.map(|c| c.lon),
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Coordinate>, D::Error> {
        let flat = Flat::deserialize(d)?;
        Ok(match (flat.lat, flat.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate { lat, lon }),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_rejects_out_of_range_and_nan() {
        assert!(Coordinate::checked(52.5, 13.4).is_some());
        assert!(Coordinate::checked(f64::NAN, 13.4).is_none());
        assert!(Coordinate::checked(91.0, 13.4).is_none());
        assert!(Coordinate::checked(52.5, -181.0).is_none());
    }

    #[test]
    fn record_serializes_flat_lat_lon() {
        let mut record = BusinessRecord::new(
            "abc".to_string(),
            "Salon Mitte".to_string(),
            "10115".to_string(),
            "Berlin".to_string(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["lat"].is_null());
        assert!(json["lon"].is_null());

        record.coordinate = Some(Coordinate::new(52.5308, 13.3847));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["lat"], 52.5308);
        assert_eq!(json["lon"], 13.3847);
    }
}
