use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::util::serde::{null_as_default, ts_milliseconds_str, ts_milliseconds_str_option};

/// Error returned when a value outside one of the closed attribute sets is
/// encountered, either in a query parameter or in a decoded payload.
///
/// Unrecognized input always fails closed, it is never silently dropped.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {0} value")]
pub struct ParseError(pub &'static str);

/// Requester gender, normalized to upper case on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("M"),
            Gender::Female => f.write_str("F"),
        }
    }
}

impl FromStr for Gender {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            _ => Err(ParseError("gender")),
        }
    }
}

/// Serving country, an ISO 3166-1 alpha-2 code normalized to upper case on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Country {
    Taiwan,
    Japan,
    UnitedStates,
    SouthKorea,
    Thailand,
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Country::Taiwan => "TW",
            Country::Japan => "JP",
            Country::UnitedStates => "US",
            Country::SouthKorea => "KR",
            Country::Thailand => "TH",
        };

        f.write_str(code)
    }
}

impl FromStr for Country {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TW" => Ok(Country::Taiwan),
            "JP" => Ok(Country::Japan),
            "US" => Ok(Country::UnitedStates),
            "KR" => Ok(Country::SouthKorea),
            "TH" => Ok(Country::Thailand),
            _ => Err(ParseError("country")),
        }
    }
}

/// Serving platform, normalized to lower case on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => f.write_str("ios"),
            Platform::Android => f.write_str("android"),
            Platform::Web => f.write_str("web"),
        }
    }
}

impl FromStr for Platform {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "web" => Ok(Platform::Web),
            _ => Err(ParseError("platform")),
        }
    }
}

macro_rules! serde_via_str {
    ($enum:ty) => {
        impl Serialize for $enum {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $enum {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;

                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_via_str!(Gender);
serde_via_str!(Country);
serde_via_str!(Platform);

/// One eligibility rule bundle attached to an [`Advertisement`].
///
/// Every set left empty (or `null` on the wire) is a wildcard for its
/// dimension. The age range is inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub age_start: i32,
    #[serde(default)]
    pub age_end: i32,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gender: Vec<Gender>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub country: Vec<Country>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub platform: Vec<Platform>,
}

/// A stored advertisement with its validity window and display conditions.
///
/// An ad with no conditions is shown to every requester within the window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub title: String,
    #[serde(with = "ts_milliseconds_str")]
    pub start_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds_str")]
    pub end_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditions: Vec<Condition>,
}

/// Intake validation error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// `title`, `startAt` and `endAt` must all be present and non-empty.
    #[error("Missing required fields")]
    MissingRequiredField,
}

/// The intake shape of an [`Advertisement`].
///
/// Submitted payloads may omit any field, [`CreateAd::validate`] decides
/// whether the submission is complete enough to store. Condition internals
/// (age range ordering, duplicate entries) are accepted as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAd {
    #[serde(default)]
    pub title: String,
    #[serde(
        default,
        with = "ts_milliseconds_str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "ts_milliseconds_str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditions: Vec<Condition>,
}

impl CreateAd {
    /// Checks the required fields and creates the actual [`Advertisement`].
    pub fn validate(self) -> Result<Advertisement, IntakeError> {
        match (self.title.is_empty(), self.start_at, self.end_at) {
            (false, Some(start_at), Some(end_at)) => Ok(Advertisement {
                title: self.title,
                start_at,
                end_at,
                conditions: self.conditions,
            }),
            _ => Err(IntakeError::MissingRequiredField),
        }
    }

    pub fn from_ad(ad: Advertisement) -> Self {
        Self {
            title: ad.title,
            start_at: Some(ad.start_at),
            end_at: Some(ad.end_at),
            conditions: ad.conditions,
        }
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use tokio_postgres::{types::Json, Row};

    use super::{Advertisement, Condition};

    impl TryFrom<&Row> for Advertisement {
        type Error = tokio_postgres::Error;

        fn try_from(row: &Row) -> Result<Self, Self::Error> {
            Ok(Self {
                title: row.try_get("title")?,
                start_at: row.try_get("start_at")?,
                end_at: row.try_get("end_at")?,
                conditions: row.try_get::<_, Json<Vec<Condition>>>("conditions")?.0,
            })
        }
    }
}
