//! `/api/v1/ad` routes.
//!
//! `GET` lists the ads eligible for the requester attributes at the current
//! time, `POST` validates and stores a submitted ad.

use std::sync::Arc;

use axum::{body::Bytes, extract::Query, http::StatusCode, Extension, Json};
use chrono::Utc;
use primitives::{
    ad::CreateAd,
    display::{DisplayAds, Pagination},
    targeting::{self, AdQuery, Input},
    Advertisement,
};
use slog::error;

use crate::{db::AdRepository, response::ResponseError, Application};

/// `GET /api/v1/ad` with the optional parameters `age`, `gender`, `country`,
/// `platform`, `offset` and `limit`.
///
/// Parameter validation happens before the catalog is read; the storage
/// client only narrows by time, the condition semantics are applied here.
pub async fn ad_list<R: AdRepository>(
    Extension(app): Extension<Arc<Application<R>>>,
    Query(query): Query<AdQuery>,
) -> Result<Json<DisplayAds>, ResponseError> {
    let input = Input::try_from(&query)?;
    let pagination = Pagination::from_query(query.offset.as_deref(), query.limit.as_deref());

    let now = Utc::now();
    let active = match app.repository.active(now).await {
        Ok(ads) => ads,
        Err(error) => {
            error!(&app.logger, "{}", &error; "module" => "ad_list");
            return Err(error.into());
        }
    };

    let eligible = targeting::eligible(active, now, &input);

    Ok(Json(DisplayAds::assemble(eligible, pagination)))
}

/// `POST /api/v1/ad` with an advertisement JSON body.
///
/// Echoes the stored record back with `201 Created`.
pub async fn create_ad<R: AdRepository>(
    Extension(app): Extension<Arc<Application<R>>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Advertisement>), ResponseError> {
    let create_ad =
        serde_json::from_slice::<CreateAd>(&body).map_err(|_| ResponseError::MalformedPayload)?;

    let ad = create_ad.validate()?;

    if let Err(error) = app.repository.add(&ad).await {
        error!(&app.logger, "{}", &error; "module" => "create_ad");
        return Err(error.into());
    }

    Ok((StatusCode::CREATED, Json(ad)))
}

#[cfg(test)]
mod test {
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use primitives::{targeting::InvalidParameter, Condition, Country, Platform};
    use serde_json::json;
    use slog::{o, Discard, Logger};

    use crate::{
        application::{DEFAULT_IP_ADDR, DEFAULT_PORT},
        db::MemoryAdRepository,
        Config, Environment,
    };

    use super::*;

    fn test_app(ads: &[Advertisement]) -> Arc<Application<MemoryAdRepository>> {
        let config = Config {
            env: Environment::Development,
            port: DEFAULT_PORT,
            ip_addr: DEFAULT_IP_ADDR,
        };
        let logger = Logger::root(Discard, o!());

        Arc::new(Application::new(
            config,
            logger,
            MemoryAdRepository::new(ads),
        ))
    }

    fn datetime(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("Should parse datetime")
    }

    fn catalog() -> Vec<Advertisement> {
        vec![
            // expired long ago, never eligible
            Advertisement {
                title: "Test Ad 1".to_string(),
                start_at: datetime("2020-01-01T00:00:00.000Z"),
                end_at: datetime("2020-12-31T00:00:00.000Z"),
                conditions: vec![],
            },
            Advertisement {
                title: "Test Ad 2".to_string(),
                start_at: datetime("2023-04-01T00:00:00.000Z"),
                end_at: datetime("2099-05-31T00:00:00.000Z"),
                conditions: vec![Condition {
                    age_start: 20,
                    age_end: 30,
                    gender: vec![],
                    country: vec![Country::SouthKorea, Country::Japan],
                    platform: vec![Platform::Ios],
                }],
            },
            // active, but android-only
            Advertisement {
                title: "Test Ad 3".to_string(),
                start_at: datetime("2023-04-01T00:00:00.000Z"),
                end_at: datetime("2098-01-01T00:00:00.000Z"),
                conditions: vec![Condition {
                    age_start: 0,
                    age_end: 0,
                    gender: vec![],
                    country: vec![],
                    platform: vec![Platform::Android],
                }],
            },
        ]
    }

    #[tokio::test]
    async fn lists_eligible_ads_for_the_requester() {
        let app = test_app(&catalog());

        let query = AdQuery {
            age: Some("24".to_string()),
            gender: Some("F".to_string()),
            country: Some("KR".to_string()),
            platform: Some("ios".to_string()),
            limit: Some("3".to_string()),
            ..AdQuery::default()
        };

        let display = ad_list(Extension(app), Query(query))
            .await
            .expect("Should list ads");

        assert_eq!(
            json!({
                "items": [
                    { "title": "Test Ad 2", "endAt": "2099-05-31T00:00:00.000Z" }
                ]
            }),
            serde_json::to_value(&display.0).expect("Should serialize")
        );
    }

    #[tokio::test]
    async fn lists_every_active_ad_without_parameters() {
        let app = test_app(&catalog());

        let display = ad_list(Extension(app), Query(AdQuery::default()))
            .await
            .expect("Should list ads");

        // sorted soonest-expiring first, the expired ad is gated out
        let titles: Vec<&str> = display
            .0
            .items
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        assert_eq!(vec!["Test Ad 3", "Test Ad 2"], titles);
    }

    #[tokio::test]
    async fn paginates_the_listing() {
        let app = test_app(&catalog());

        let offset_past_the_end = AdQuery {
            offset: Some("5".to_string()),
            ..AdQuery::default()
        };
        let display = ad_list(Extension(app.clone()), Query(offset_past_the_end))
            .await
            .expect("Should list ads");
        assert!(display.0.items.is_empty());

        let malformed_limit = AdQuery {
            limit: Some("abc".to_string()),
            ..AdQuery::default()
        };
        let display = ad_list(Extension(app.clone()), Query(malformed_limit))
            .await
            .expect("Should list ads");
        assert_eq!(2, display.0.items.len(), "malformed limit means take-all");

        let windowed = AdQuery {
            offset: Some("1".to_string()),
            limit: Some("1".to_string()),
            ..AdQuery::default()
        };
        let display = ad_list(Extension(app), Query(windowed))
            .await
            .expect("Should list ads");
        assert_eq!("Test Ad 2", display.0.items[0].title);
    }

    #[tokio::test]
    async fn rejects_invalid_parameters_before_reading_the_catalog() {
        let app = test_app(&catalog());

        for (query, expected) in [
            (
                AdQuery {
                    age: Some("abc".to_string()),
                    ..AdQuery::default()
                },
                InvalidParameter::Age,
            ),
            (
                AdQuery {
                    gender: Some("H".to_string()),
                    ..AdQuery::default()
                },
                InvalidParameter::Gender,
            ),
            (
                AdQuery {
                    country: Some("AAA".to_string()),
                    ..AdQuery::default()
                },
                InvalidParameter::Country,
            ),
            (
                AdQuery {
                    platform: Some("ABC".to_string()),
                    ..AdQuery::default()
                },
                InvalidParameter::Platform,
            ),
        ] {
            let error = ad_list(Extension(app.clone()), Query(query))
                .await
                .expect_err("Should reject the parameter");

            assert_eq!(ResponseError::InvalidParameter(expected), error);
        }
    }

    #[tokio::test]
    async fn creates_an_ad_and_echoes_the_stored_record() {
        let app = test_app(&[]);

        // casing is normalized while binding the payload
        let body = Bytes::from(
            r#"{
                "title": "Test Ad 2",
                "startAt": "2023-04-01T00:00:00.000Z",
                "endAt": "2099-05-31T00:00:00.000Z",
                "conditions": [{
                    "ageStart": 20,
                    "ageEnd": 30,
                    "gender": null,
                    "country": ["kr", "jp"],
                    "platform": ["iOS"]
                }]
            }"#,
        );

        let (status, stored) = create_ad(Extension(app.clone()), body)
            .await
            .expect("Should create the ad");

        assert_eq!(StatusCode::CREATED, status);
        assert_eq!("Test Ad 2", stored.0.title);
        assert_eq!(
            vec![Country::SouthKorea, Country::Japan],
            stored.0.conditions[0].country
        );

        // the stored ad is immediately served
        let query = AdQuery {
            age: Some("24".to_string()),
            gender: Some("F".to_string()),
            country: Some("KR".to_string()),
            platform: Some("ios".to_string()),
            ..AdQuery::default()
        };
        let display = ad_list(Extension(app), Query(query))
            .await
            .expect("Should list ads");
        assert_eq!("Test Ad 2", display.0.items[0].title);
    }

    #[tokio::test]
    async fn rejects_an_incomplete_ad_without_storing_it() {
        let app = test_app(&[]);

        let body = Bytes::from(r#"{ "title": "", "startAt": "2023-04-01T00:00:00.000Z" }"#);
        let error = create_ad(Extension(app.clone()), body)
            .await
            .expect_err("Should reject the submission");
        assert_eq!(ResponseError::MissingRequiredField, error);

        let body = Bytes::from(r#"{ "title": "No window" }"#);
        let error = create_ad(Extension(app.clone()), body)
            .await
            .expect_err("Should reject the submission");
        assert_eq!(ResponseError::MissingRequiredField, error);

        // nothing reached the repository
        let display = ad_list(Extension(app), Query(AdQuery::default()))
            .await
            .expect("Should list ads");
        assert!(display.0.items.is_empty());
    }

    #[tokio::test]
    async fn rejects_a_payload_that_does_not_bind() {
        let app = test_app(&[]);

        // title must be a string
        let body = Bytes::from(r#"{ "title": 123 }"#);
        let error = create_ad(Extension(app.clone()), body)
            .await
            .expect_err("Should reject the payload");
        assert_eq!(ResponseError::MalformedPayload, error);

        let body = Bytes::from("not json at all");
        let error = create_ad(Extension(app), body)
            .await
            .expect_err("Should reject the payload");
        assert_eq!(ResponseError::MalformedPayload, error);
    }

    #[tokio::test]
    async fn gender_wildcard_and_age_range_from_the_intake_example() {
        // the end-to-end scenario: intake the ad through the write path, then
        // query it through the read path with a matching requester
        let app = test_app(&[]);

        let ad = Advertisement {
            title: "Test Ad 2".to_string(),
            start_at: datetime("2023-04-01T00:00:00.000Z"),
            end_at: datetime("2099-05-31T00:00:00.000Z"),
            conditions: vec![Condition {
                age_start: 20,
                age_end: 30,
                gender: vec![],
                country: vec![Country::SouthKorea, Country::Japan],
                platform: vec![Platform::Ios],
            }],
        };
        let body = Bytes::from(
            serde_json::to_vec(&CreateAd::from_ad(ad)).expect("Should serialize"),
        );

        create_ad(Extension(app.clone()), body)
            .await
            .expect("Should create the ad");

        let query = AdQuery {
            age: Some("24".to_string()),
            gender: Some("F".to_string()),
            country: Some("KR".to_string()),
            platform: Some("ios".to_string()),
            limit: Some("3".to_string()),
            ..AdQuery::default()
        };
        let display = ad_list(Extension(app), Query(query))
            .await
            .expect("Should list ads");

        assert_eq!(
            json!({
                "items": [
                    { "title": "Test Ad 2", "endAt": "2099-05-31T00:00:00.000Z" }
                ]
            }),
            serde_json::to_value(&display.0).expect("Should serialize")
        );
    }
}
