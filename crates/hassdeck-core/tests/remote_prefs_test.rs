// `RemotePrefs` against a wiremock preference store.
#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hassdeck_api::TransportConfig;
use hassdeck_core::{CoreError, EntityId, PreferenceBackend, PreferenceStoreConfig, RemotePrefs};

async fn setup() -> (MockServer, RemotePrefs) {
    let server = MockServer::start().await;
    let config = PreferenceStoreConfig {
        url: Url::parse(&server.uri()).unwrap(),
        token: None,
    };
    let prefs = RemotePrefs::from_config(&config, &TransportConfig::default()).unwrap();
    (server, prefs)
}

#[tokio::test]
async fn test_fetch_collects_parts() {
    let (server, prefs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/preferences/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"weather_source": "weather.home"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/preferences/hidden_entities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["sensor.noise"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/preferences/hidden_rooms"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/preferences/custom_names"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let bundle = prefs.fetch().await.unwrap();

    assert_eq!(
        bundle.settings.unwrap()["weather_source"],
        json!("weather.home")
    );
    assert_eq!(
        bundle.hidden_entities.unwrap(),
        BTreeSet::from([EntityId::from("sensor.noise")])
    );
    assert!(bundle.hidden_rooms.is_none());
    assert!(bundle.custom_names.is_none());
}

#[tokio::test]
async fn test_availability_follows_health() {
    let (server, prefs) = setup().await;
    assert!(!prefs.is_available().await);

    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    assert!(prefs.is_available().await);
}

#[tokio::test]
async fn test_save_hidden_rooms_puts_document() {
    let (server, prefs) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/v1/preferences/hidden_rooms"))
        .and(body_json(json!(["attic", "garage"])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let rooms = BTreeSet::from(["garage".to_string(), "attic".to_string()]);
    prefs.save_hidden_rooms(&rooms).await.unwrap();
}

#[tokio::test]
async fn test_fetch_failure_maps_to_sync_error() {
    let (server, prefs) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = prefs.fetch().await.unwrap_err();
    assert!(matches!(err, CoreError::Sync { .. }));
}
