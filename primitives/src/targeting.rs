//! Matching of stored [`Advertisement`]s against the attributes of a single
//! request.
//!
//! Requesters and ad conditions restrict dimensions independently: a
//! requester leaves a dimension unfiltered by omitting the query parameter,
//! a condition leaves a dimension unrestricted by keeping its set empty.
//! Both default to "no restriction", never to "reject".

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::ad::{Advertisement, Condition, Country, Gender, Platform};

/// A query parameter that failed validation.
///
/// Validation is ordered (age, gender, country, platform) and short-circuits,
/// so a request carrying several invalid parameters reports only the first.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidParameter {
    #[error("invalid age parameter")]
    Age,
    #[error("invalid gender parameter")]
    Gender,
    #[error("invalid country parameter")]
    Country,
    #[error("invalid platform parameter")]
    Platform,
}

/// The raw query string shape of the ad listing request.
///
/// Every field arrives as an uninterpreted string; [`Input`] carries the
/// validated attributes, [`crate::display::Pagination`] the window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdQuery {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub platform: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

/// Validated requester attributes. `None` means the requester did not filter
/// on that dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Input {
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub country: Option<Country>,
    pub platform: Option<Platform>,
}

impl TryFrom<&AdQuery> for Input {
    type Error = InvalidParameter;

    fn try_from(query: &AdQuery) -> Result<Self, Self::Error> {
        let age = supplied(&query.age)
            .map(|raw| raw.parse::<i32>().map_err(|_| InvalidParameter::Age))
            .transpose()?;
        let gender = supplied(&query.gender)
            .map(|raw| raw.parse::<Gender>().map_err(|_| InvalidParameter::Gender))
            .transpose()?;
        let country = supplied(&query.country)
            .map(|raw| raw.parse::<Country>().map_err(|_| InvalidParameter::Country))
            .transpose()?;
        let platform = supplied(&query.platform)
            .map(|raw| raw.parse::<Platform>().map_err(|_| InvalidParameter::Platform))
            .transpose()?;

        Ok(Self {
            age,
            gender,
            country,
            platform,
        })
    }
}

/// A parameter that is present but empty counts as omitted.
fn supplied(parameter: &Option<String>) -> Option<&str> {
    parameter.as_deref().filter(|raw| !raw.is_empty())
}

impl Advertisement {
    /// Temporal gate: the ad may only be shown while `startAt <= now <= endAt`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start_at <= now && now <= self.end_at
    }
}

impl Condition {
    /// An age range of `[0, 0]` (the intake default) leaves age unrestricted,
    /// matching the wildcard story of the set dimensions.
    fn is_age_unrestricted(&self) -> bool {
        self.age_start == 0 && self.age_end == 0
    }

    /// Whether this condition accepts the requester on every dimension the
    /// requester supplied.
    pub fn matches(&self, input: &Input) -> bool {
        let age = input.age.map_or(true, |age| {
            self.is_age_unrestricted() || (self.age_start <= age && age <= self.age_end)
        });
        let gender = input.gender.map_or(true, |gender| {
            self.gender.is_empty() || self.gender.contains(&gender)
        });
        let country = input.country.map_or(true, |country| {
            self.country.is_empty() || self.country.contains(&country)
        });
        let platform = input.platform.map_or(true, |platform| {
            self.platform.is_empty() || self.platform.contains(&platform)
        });

        age && gender && country && platform
    }
}

/// Filters a catalog snapshot down to the ads eligible for `input` at `now`.
///
/// An ad without conditions only has to pass the temporal gate. Otherwise at
/// least one of its conditions has to match. This holds regardless of how
/// much filtering the storage layer already performed.
pub fn eligible(ads: Vec<Advertisement>, now: DateTime<Utc>, input: &Input) -> Vec<Advertisement> {
    ads.into_iter()
        .filter(|ad| ad.is_active(now))
        .filter(|ad| {
            ad.conditions.is_empty() || ad.conditions.iter().any(|condition| condition.matches(input))
        })
        .collect()
}
