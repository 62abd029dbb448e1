/// (De)serializes a `DateTime<Utc>` in the wire format of the API,
/// e.g. `2099-05-31T00:00:00.000Z`.
///
/// Deserialization accepts any RFC 3339 timestamp, serialization always
/// emits millisecond precision with a `Z` suffix.
pub mod ts_milliseconds_str {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&dt.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;

        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// Same wire format as [`ts_milliseconds_str`] for an `Option<DateTime<Utc>>`,
/// treating JSON `null` (and, with `#[serde(default)]`, an absent key) as `None`.
pub mod ts_milliseconds_str_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::ts_milliseconds_str::FORMAT;

    pub fn serialize<S>(opt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match opt {
            Some(dt) => serializer.collect_str(&dt.format(FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(de::Error::custom)
            })
            .transpose()
    }
}

/// Deserializes a field tolerating JSON `null` as the type's default value.
///
/// Used for the condition sets, where `"gender": null` and `"gender": []`
/// both mean an unrestricted dimension.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let opt = <Option<T> as serde::Deserialize<'de>>::deserialize(deserializer)?;

    Ok(opt.unwrap_or_default())
}
