use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Rendering of an entry's timestamp, `DD/MM/YYYY HH:mm:ss`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
/// Date prefix of [`TIMESTAMP_FORMAT`].
pub const TIMESTAMP_DATE_FORMAT: &str = "%d/%m/%Y";

/// One row of the personnel directory CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "patente")]
    pub rank: String,
}

impl PersonRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rank: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rank: rank.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub username: String,
    pub password: String,
}

/// What a submission or an admin edit carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFields {
    pub justification: String,
    pub present: bool,
}

impl EntryFields {
    pub fn present() -> Self {
        Self {
            justification: String::new(),
            present: true,
        }
    }

    pub fn justified(reason: impl Into<String>) -> Self {
        Self {
            justification: reason.into(),
            present: false,
        }
    }
}

/// One person's attendance record for the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub person_id: String,
    pub justification: String,
    pub present: bool,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
}

impl AttendanceEntry {
    pub fn is_justified(&self) -> bool {
        !self.justification.is_empty()
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// True when the rendered timestamp starts with `day` in `DD/MM/YYYY`.
    pub fn is_on(&self, day: NaiveDate) -> bool {
        let prefix = day.format(TIMESTAMP_DATE_FORMAT).to_string();
        self.timestamp_string().starts_with(&prefix)
    }

    pub fn status_label(&self) -> &'static str {
        if self.present { "Presente" } else { "Justificado" }
    }
}

mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
