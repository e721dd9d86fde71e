mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{send, signup_and_login, test_app};

fn point() -> Value {
    json!({"type": "Point", "coordinates": [-55.5, -30.8]})
}

/// The full life of one feature: register, login, create, list, edit
/// properties, list again, delete, list empty.
#[tokio::test]
async fn end_to_end_feature_lifecycle() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    // create
    let (status, body) = send(
        &app,
        "POST",
        "/data",
        Some(&token),
        Some(&json!({"geometry": point(), "properties": {"title": "P1"}})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().expect("id in create response").to_string();

    // list: exactly one feature, geometry and properties intact
    let (status, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["type"], "Feature");
    assert_eq!(features[0]["id"], id.as_str());
    assert_eq!(features[0]["geometry"], point());
    assert_eq!(features[0]["properties"], json!({"title": "P1"}));

    // update properties (full replacement)
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/data/{}", id),
        Some(&token),
        Some(&json!({"properties": {"title": "P2"}})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (_, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    assert_eq!(body["features"][0]["properties"], json!({"title": "P2"}));

    // delete: 204 with an empty body
    let (status, body) = send(&app, "DELETE", &format!("/data/{}", id), Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    assert_eq!(body["features"].as_array().unwrap().len(), 0);
    Ok(())
}

#[tokio::test]
async fn records_are_invisible_and_untouchable_across_accounts() -> Result<()> {
    let app = test_app();
    let alice = signup_and_login(&app, "alice@x.com", "pw123456").await?;
    let bob = signup_and_login(&app, "bob@x.com", "pw123456").await?;

    let (_, body) = send(
        &app,
        "POST",
        "/data",
        Some(&alice),
        Some(&json!({"geometry": point(), "properties": {"title": "alice's"}})),
    )
    .await?;
    let id = body["id"].as_str().unwrap().to_string();

    // invisible to bob
    let (_, body) = send(&app, "GET", "/data", Some(&bob), None).await?;
    assert_eq!(body["features"].as_array().unwrap().len(), 0);

    // bob's update and delete against alice's id: the same 404 an absent
    // record would give, so he cannot even learn that it exists
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/data/{}", id),
        Some(&bob),
        Some(&json!({"properties": {"title": "bob's now"}})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/data/{}", id), Some(&bob), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // alice's record is untouched
    let (_, body) = send(&app, "GET", "/data", Some(&alice), None).await?;
    assert_eq!(body["features"][0]["properties"], json!({"title": "alice's"}));
    Ok(())
}

#[tokio::test]
async fn create_without_geometry_is_400() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    let (status, _) = send(
        &app,
        "POST",
        "/data",
        Some(&token),
        Some(&json!({"properties": {"title": "no shape"}})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unparseable_geometry_is_500_and_not_stored() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    let (status, body) = send(
        &app,
        "POST",
        "/data",
        Some(&token),
        Some(&json!({"geometry": {"type": "Point"}})),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // generic message only, no parser detail
    assert!(!body["message"].as_str().unwrap_or("").contains("coordinates"));

    let (_, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    assert_eq!(body["features"].as_array().unwrap().len(), 0);
    Ok(())
}

#[tokio::test]
async fn omitted_properties_default_to_empty_object() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    send(
        &app,
        "POST",
        "/data",
        Some(&token),
        Some(&json!({"geometry": point()})),
    )
    .await?;

    let (_, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    assert_eq!(body["features"][0]["properties"], json!({}));
    Ok(())
}

#[tokio::test]
async fn update_without_properties_is_400() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    let (_, body) = send(
        &app,
        "POST",
        "/data",
        Some(&token),
        Some(&json!({"geometry": point()})),
    )
    .await?;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/data/{}", id),
        Some(&token),
        Some(&json!({})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn deleting_twice_reports_not_found_every_time() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    let (_, body) = send(
        &app,
        "POST",
        "/data",
        Some(&token),
        Some(&json!({"geometry": point()})),
    )
    .await?;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/data/{}", id), Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", &format!("/data/{}", id), Some(&token), None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (_, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    assert_eq!(body["features"].as_array().unwrap().len(), 0);
    Ok(())
}

#[tokio::test]
async fn integer_coordinates_survive_storage_exactly() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    // JSON integers, including one past 2^53 that f64 cannot represent
    let origin = json!({"type": "Point", "coordinates": [0, 0]});
    let precise = json!({"type": "Point", "coordinates": [9007199254740993i64, 1]});

    for geometry in [&origin, &precise] {
        let (status, _) = send(
            &app,
            "POST",
            "/data",
            Some(&token),
            Some(&json!({"geometry": geometry})),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    assert_eq!(body["features"][0]["geometry"], origin);
    assert_eq!(body["features"][1]["geometry"], precise);
    Ok(())
}

#[tokio::test]
async fn multi_megabyte_geometry_is_accepted() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    // ~3 MB of LineString coordinates, past the 2 MB framework default
    let coords: Vec<Value> = (0..120_000)
        .map(|i| {
            json!([
                -55.5 + (i % 1000) as f64 * 0.0001,
                -30.8 + (i / 1000) as f64 * 0.0001
            ])
        })
        .collect();
    let line = json!({"type": "LineString", "coordinates": coords});
    assert!(serde_json::to_vec(&line)?.len() > 2 * 1024 * 1024);

    let (status, _) = send(
        &app,
        "POST",
        "/data",
        Some(&token),
        Some(&json!({"geometry": line})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn complex_geometries_survive_storage() -> Result<()> {
    let app = test_app();
    let token = signup_and_login(&app, "a@x.com", "pw123456").await?;

    let polygon = json!({
        "type": "Polygon",
        "coordinates": [
            [[-55.5, -30.8], [-55.25, -30.8], [-55.25, -30.5], [-55.5, -30.8]]
        ]
    });
    let line = json!({
        "type": "LineString",
        "coordinates": [[-55.5, -30.8], [-55.25, -30.75], [-55.125, -30.5]]
    });

    for geometry in [&polygon, &line] {
        let (status, _) = send(
            &app,
            "POST",
            "/data",
            Some(&token),
            Some(&json!({"geometry": geometry})),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, "GET", "/data", Some(&token), None).await?;
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    // insertion order, geometry bit-for-bit
    assert_eq!(features[0]["geometry"], polygon);
    assert_eq!(features[1]["geometry"], line);
    Ok(())
}
