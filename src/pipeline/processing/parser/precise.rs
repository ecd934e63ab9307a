use super::{lenient_f64, lenient_object, lenient_string, nullable_vec};
use crate::constants::WGS84_FORMAT;
use crate::types::Coordinate;
use serde::Deserialize;

/// One line of the precise contact export, nested under
/// `antwort -> daten -> teilnehmer`.
#[derive(Debug, Deserialize)]
pub struct PreciseLine {
    #[serde(rename = "antwort", default, deserialize_with = "lenient_object")]
    pub answer: Option<Answer>,
}

#[derive(Debug, Deserialize)]
pub struct Answer {
    #[serde(rename = "daten", default, deserialize_with = "lenient_object")]
    pub data: Option<AnswerData>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerData {
    #[serde(rename = "teilnehmer", default, deserialize_with = "lenient_object")]
    pub participant: Option<Participant>,
}

#[derive(Debug, Deserialize)]
pub struct Participant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "adresse", default, deserialize_with = "lenient_object")]
    pub address: Option<ParticipantAddress>,
    #[serde(rename = "kontakt", default, deserialize_with = "lenient_object")]
    pub contact: Option<ParticipantContact>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantAddress {
    #[serde(rename = "anzeige_strasse", default, deserialize_with = "lenient_string")]
    pub display_street: Option<String>,
    #[serde(rename = "strasse", default, deserialize_with = "lenient_string")]
    pub street: Option<String>,
    #[serde(rename = "hausnr", default, deserialize_with = "lenient_string")]
    pub house_number: Option<String>,
    #[serde(rename = "stadtteil", default, deserialize_with = "lenient_string")]
    pub district: Option<String>,
    #[serde(rename = "geodaten", default, deserialize_with = "lenient_object")]
    pub geodata: Option<Geodata>,
}

#[derive(Debug, Deserialize)]
pub struct Geodata {
    #[serde(rename = "koordinaten", default, deserialize_with = "nullable_vec")]
    pub coordinates: Vec<CoordinateEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CoordinateEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantContact {
    #[serde(rename = "telefon", default, deserialize_with = "nullable_vec")]
    pub phones: Vec<PhoneEntry>,
    #[serde(rename = "email", default, deserialize_with = "nullable_vec")]
    pub emails: Vec<EmailEntry>,
    #[serde(rename = "www", default, deserialize_with = "nullable_vec")]
    pub websites: Vec<WebsiteEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PhoneEntry {
    #[serde(rename = "rufnummer", default, deserialize_with = "lenient_string")]
    pub number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailEntry {
    #[serde(rename = "email", default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebsiteEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

impl PreciseLine {
    pub fn participant(&self) -> Option<&Participant> {
        self.answer.as_ref()?.data.as_ref()?.participant.as_ref()
    }
}

impl ParticipantAddress {
    /// First WGS84-tagged entry; x is longitude and y latitude.
    pub fn wgs84_coordinate(&self) -> Option<Coordinate> {
        let entry = self
            .geodata
            .as_ref()?
            .coordinates
            .iter()
            .find(|c| c.format.as_deref() == Some(WGS84_FORMAT))?;
        Coordinate::checked(entry.y?, entry.x?)
    }

    /// "Street HouseNumber" when a street is known.
    pub fn street_address(&self) -> Option<String> {
        let street = self.display_street.as_deref().or(self.street.as_deref())?;
        let full = match self.house_number.as_deref() {
            Some(number) => format!("{} {}", street, number),
            None => street.to_string(),
        };
        Some(full.trim().to_string())
    }
}

impl ParticipantContact {
    pub fn first_phone(&self) -> Option<&str> {
        self.phones.first()?.number.as_deref()
    }

    pub fn first_email(&self) -> Option<&str> {
        self.emails.first()?.address.as_deref()
    }

    pub fn first_website(&self) -> Option<&str> {
        self.websites.first()?.url.as_deref()
    }
}
