use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "M", alias = "m", alias = "Male")]
    Male,
    #[serde(alias = "F", alias = "f", alias = "Female")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(format!("unknown driver gender '{other}', expected male or female")),
        }
    }
}

/// One traffic stop as stored in the police log table.
///
/// Column names follow the table layout (`stop_outcome`, `driver_age`, ...).
/// Columns the ledger does not use are ignored when reading.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StopRecord {
    pub stop_date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub stop_time: NaiveTime,
    #[serde(alias = "country_name")]
    pub county_name: String,
    pub driver_gender: Gender,
    pub driver_age: u32,
    pub driver_race: String,
    #[serde(with = "flag")]
    pub search_conducted: bool,
    #[serde(default)]
    pub search_type: String,
    #[serde(with = "flag")]
    pub drugs_related_stop: bool,
    pub stop_duration: String,
    pub violation: String,
    pub stop_outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
}

/// Rows read from a stop log export.
///
/// Rows that cannot be deserialized are left out and counted in
/// `skipped_rows`; the rest of the log stays usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopLog {
    pub records: Vec<StopRecord>,
    pub skipped_rows: usize,
}

impl StopRecord {
    pub fn load_csv(filename: impl AsRef<Path>) -> Result<StopLog> {
        let rdr = Self::reader_builder().from_path(filename)?;
        Self::collect_records(rdr)
    }

    pub fn read_csv<R: io::Read>(reader: R) -> Result<StopLog> {
        Self::collect_records(Self::reader_builder().from_reader(reader))
    }

    // padding is stripped here so every later comparison sees the stored value
    fn reader_builder() -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.trim(csv::Trim::All);
        builder
    }

    fn collect_records<R: io::Read>(mut rdr: csv::Reader<R>) -> Result<StopLog> {
        let mut log = StopLog::default();
        for (index, result) in rdr.deserialize::<StopRecord>().enumerate() {
            match result {
                Ok(record) => log.records.push(record),
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(row = index + 1, error = %err, "skipping unreadable stop row");
                    log.skipped_rows += 1;
                }
            }
        }
        Ok(log)
    }

    pub fn is_arrest(&self) -> bool {
        contains_ignore_case(&self.stop_outcome, "arrest")
    }

    pub fn is_warning(&self) -> bool {
        contains_ignore_case(&self.stop_outcome, "warning")
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Booleans stored as `0`/`1` in the log table, or as JSON booleans.
mod flag {
    use std::fmt;

    use serde::de::{self, Unexpected, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean, 0/1 or true/false")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }
}

/// Stop times appear both with and without seconds.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%I:%M %p"];

    pub fn serialize<S: Serializer>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(raw.trim())
            .ok_or_else(|| de::Error::custom(format!("invalid stop time '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
    }
}

pub fn parse_stop_time(raw: &str) -> std::result::Result<NaiveTime, String> {
    time_of_day::parse(raw.trim()).ok_or_else(|| format!("invalid stop time '{raw}'"))
}
