//! End-to-end session behavior against a recording broker link

use fieldcam::config::ConnectionPolicy;
use fieldcam::payload::GeoPoint;
use fieldcam::session::PublishSession;
use fieldcam::testing::mocks::MockLink;
use fieldcam::PublishError;
use image::RgbImage;

fn solid_frame() -> RgbImage {
    RgbImage::from_pixel(320, 240, image::Rgb([60, 110, 40]))
}

fn capture_site() -> GeoPoint {
    GeoPoint {
        latitude: -22.772663,
        longitude: -43.6857564,
    }
}

fn session(link: MockLink) -> PublishSession<MockLink> {
    PublishSession::new(link, "animal/photos", true, ConnectionPolicy::default())
}

#[tokio::test]
async fn published_wire_message_matches_the_contract() {
    let link = MockLink::new();
    let recorder = link.recorder();

    session(link)
        .publish("cachorro", &solid_frame(), capture_site())
        .await
        .unwrap();

    let published = recorder.published().await;
    assert_eq!(published.len(), 1);

    let (wire_topic, bytes, retain) = &published[0];
    assert_eq!(wire_topic, "animal/photos/cachorro");
    assert!(*retain);

    let json: serde_json::Value = serde_json::from_slice(bytes).unwrap();
    assert_eq!(json["topic"], "cachorro");
    assert_eq!(json["location"]["latitude"], -22.772663);
    assert_eq!(json["location"]["longitude"], -43.6857564);

    let photo = json["photo"].as_str().unwrap();
    assert!(!photo.is_empty());

    // date matches YYYY-MM-DDThh:mm:ss with no offset
    let date = json["date"].as_str().unwrap();
    assert_eq!(date.len(), 19);
    assert!(chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S").is_ok());
}

#[tokio::test]
async fn photo_field_decodes_to_a_lossy_copy_of_the_frame() {
    use base64::Engine;

    let link = MockLink::new();
    let recorder = link.recorder();

    session(link)
        .publish("cachorro", &solid_frame(), capture_site())
        .await
        .unwrap();

    let published = recorder.published().await;
    let json: serde_json::Value = serde_json::from_slice(&published[0].1).unwrap();
    let jpeg = base64::engine::general_purpose::STANDARD
        .decode(json["photo"].as_str().unwrap())
        .unwrap();

    let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (320, 240));

    let px = decoded.get_pixel(160, 120);
    assert!((px[0] as i32 - 60).abs() < 16);
    assert!((px[1] as i32 - 110).abs() < 16);
    assert!((px[2] as i32 - 40).abs() < 16);
}

#[tokio::test]
async fn caller_topics_with_slashes_pass_through_unescaped() {
    let link = MockLink::new();
    let recorder = link.recorder();

    session(link)
        .publish("aves/tucano", &solid_frame(), capture_site())
        .await
        .unwrap();

    let published = recorder.published().await;
    assert_eq!(published[0].0, "animal/photos/aves/tucano");

    let json: serde_json::Value = serde_json::from_slice(&published[0].1).unwrap();
    assert_eq!(json["topic"], "aves/tucano");
}

#[tokio::test]
async fn no_connection_survives_a_successful_publish() {
    let link = MockLink::new();
    let recorder = link.recorder();

    session(link)
        .publish("onca", &solid_frame(), capture_site())
        .await
        .unwrap();

    assert!(!recorder.still_connected().await);
    assert_eq!(recorder.connect_calls().await, 1);
    assert_eq!(recorder.disconnect_calls().await, 1);
}

#[tokio::test]
async fn connect_timeout_skips_publish_and_teardown() {
    let link = MockLink::with_connect_failure();
    let recorder = link.recorder();

    let result = session(link)
        .publish("onca", &solid_frame(), capture_site())
        .await;

    match result {
        Err(PublishError::Connect(_)) => {}
        other => panic!("expected a connect error, got {other:?}"),
    }
    // No connection was ever opened, so nothing to tear down.
    assert_eq!(recorder.published().await.len(), 0);
    assert_eq!(recorder.disconnect_calls().await, 0);
    assert!(!recorder.still_connected().await);
}

#[tokio::test]
async fn failed_publish_still_tears_the_session_down() {
    let link = MockLink::with_publish_failure();
    let recorder = link.recorder();

    let result = session(link)
        .publish("onca", &solid_frame(), capture_site())
        .await;

    assert!(matches!(result, Err(PublishError::Publish(_))));
    assert_eq!(recorder.disconnect_calls().await, 1);
    assert!(!recorder.still_connected().await);
}

#[tokio::test]
async fn concurrent_publishes_own_independent_sessions() {
    let link_a = MockLink::new();
    let link_b = MockLink::new();
    let recorder_a = link_a.recorder();
    let recorder_b = link_b.recorder();

    let frame_a = solid_frame();
    let frame_b = solid_frame();
    let (a, b) = tokio::join!(
        session(link_a).publish("lobo", &frame_a, capture_site()),
        session(link_b).publish("gato", &frame_b, capture_site()),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(recorder_a.connect_calls().await, 1);
    assert_eq!(recorder_b.connect_calls().await, 1);
    assert_eq!(recorder_a.published().await.len(), 1);
    assert_eq!(recorder_b.published().await.len(), 1);
}
