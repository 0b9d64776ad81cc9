use actix_web::{App, http::StatusCode, test, web};
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use immo_api::cache::CacheLayer;
use immo_api::database::repositories::{BlogRepository, PropertyRepository, UserRepository};
use immo_api::middleware::ResponseCacheMiddleware;
use immo_api::routes;
use immo_api::services::{IconCatalog, LocationDirectory, LocationService};

mod common;
use common::{RecordingStore, TestDb, seed, settle_writes, test_layer, unreachable_pool};

const CITIES: &str = r#"
INSERT INTO `algeria_cities` (`id`, `commune_name_ascii`, `commune_name`, `daira_name_ascii`, `daira_name`, `wilaya_code`, `wilaya_name_ascii`, `wilaya_name`) VALUES
(1, 'Hydra', 'حيدرة', 'Bir Mourad Rais', 'بئر مراد رايس', '16', 'Alger', 'الجزائر'),
(2, 'Es Senia', 'السانية', 'Es Senia', 'السانية', '31', 'Oran', 'وهران');
"#;

/// The full API as `main` mounts it, over `pool` and a recording cache store.
macro_rules! api_app {
    ($pool:expr, $layer:expr) => {{
        let pool: PgPool = $pool;
        let layer: CacheLayer = $layer;
        let locations = LocationService::new(LocationDirectory::from_sql(CITIES).unwrap(), None);
        test::init_service(
            App::new()
                .app_data(web::Data::new(PropertyRepository::new(pool.clone())))
                .app_data(web::Data::new(BlogRepository::new(pool.clone())))
                .app_data(web::Data::new(UserRepository::new(pool)))
                .app_data(web::Data::new(locations))
                .app_data(web::Data::new(IconCatalog::default()))
                .app_data(web::Data::new(layer.invalidator()))
                .app_data(web::Data::new(layer.clone()))
                .wrap(ResponseCacheMiddleware::new(layer))
                .configure(routes::configure),
        )
        .await
    }};
}

async fn json_body(resp: actix_web::dev::ServiceResponse) -> serde_json::Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap()
}

fn property_json(title: &str, wilaya: &str, listing_type: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "listingType": listing_type,
        "propertyType": "apartment",
        "price": "9800000.00",
        "surfaceM2": 75,
        "rooms": 3,
        "wilayaCode": wilaya,
        "nearbyPlaces": ["Pharmacie"],
    })
}

#[actix_web::test]
async fn test_rejected_writes_leave_the_cache_alone() {
    common::setup_test_env();
    let store = Arc::new(RecordingStore::new());
    let layer = test_layer(store.clone());
    let stats_layer = layer.clone();
    let app = api_app!(unreachable_pool(), layer);

    let property_id = Uuid::new_v4();
    seed(&store, "GET:/api/users").await;
    seed(&store, "GET:/api/properties").await;
    seed(&store, &format!("GET:/api/properties/{}", property_id)).await;
    seed(&store, "GET:/api/blog").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(serde_json::json!({
                "email": "amina@immo.dz",
                "password": "short",
                "name": "Amina",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/properties/{}", property_id))
            .set_json(property_json("   ", "16", "sale"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/blog")
            .set_json(serde_json::json!({ "title": "", "content": "…" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(store.inner.contains("GET:/api/users").await);
    assert!(store.inner.contains("GET:/api/properties").await);
    assert!(
        store
            .inner
            .contains(&format!("GET:/api/properties/{}", property_id))
            .await
    );
    assert!(store.inner.contains("GET:/api/blog").await);
    assert_eq!(stats_layer.stats().snapshot().invalidations, 0);
}

#[actix_web::test]
async fn test_user_writes_invalidate_only_after_persisting() {
    let Some(db) = TestDb::new().await.unwrap() else {
        return;
    };
    let store = Arc::new(RecordingStore::new());
    let layer = test_layer(store.clone());
    let stats_layer = layer.clone();
    let app = api_app!(db.pool.clone(), layer);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/users").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["data"]["total"], 0);
    settle_writes(&store, 1).await;
    assert!(store.inner.contains("GET:/api/users").await);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(serde_json::json!({
                "email": "amina@immo.dz",
                "password": "correct-horse",
                "name": "Amina",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert!(created["data"].get("passwordHash").is_none());
    let user_id = created["data"]["id"].as_str().unwrap().to_string();
    assert!(!store.inner.contains("GET:/api/users").await);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/users").to_request()).await;
    assert_eq!(json_body(resp).await["data"]["total"], 1);
    settle_writes(&store, 2).await;
    assert!(store.inner.contains("GET:/api/users").await);
    let invalidations = stats_layer.stats().snapshot().invalidations;

    // unknown ids fail before anything is invalidated
    let missing = Uuid::new_v4();
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/users/{}", missing))
            .set_json(serde_json::json!({ "name": "Personne" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{}", missing))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(store.inner.contains("GET:/api/users").await);
    assert_eq!(stats_layer.stats().snapshot().invalidations, invalidations);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/users/{}", user_id))
            .set_json(serde_json::json!({ "role": "agent" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["data"]["role"], "agent");
    assert!(!store.inner.contains("GET:/api/users").await);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/users").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    settle_writes(&store, 3).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{}", user_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!store.inner.contains("GET:/api/users").await);

    db.cleanup().await;
}

#[actix_web::test]
async fn test_property_listing_through_the_full_stack() {
    let Some(db) = TestDb::new().await.unwrap() else {
        return;
    };
    let store = Arc::new(RecordingStore::new());
    let app = api_app!(db.pool.clone(), test_layer(store.clone()));

    for (title, wilaya, listing_type) in [
        ("F3 Hydra", "16", "rent"),
        ("Villa Hydra", "16", "sale"),
        ("F2 Es Senia", "31", "rent"),
    ] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/properties")
                .set_json(property_json(title, wilaya, listing_type))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    // wilaya given by name resolves to its code
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/properties?wilaya=Alger")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["data"]["total"], 2);
    settle_writes(&store, 1).await;
    assert!(store.inner.contains("GET:/api/properties?wilaya=Alger").await);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/properties?listing_type=rent&limit=1&page=2")
            .to_request(),
    )
    .await;
    let json = json_body(resp).await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["totalPages"], 2);
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 1);

    // a new listing drops every cached property page
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/properties")
            .set_json(property_json("Duplex Hydra", "16", "sale"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let property_id = json_body(resp).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(!store.inner.contains("GET:/api/properties?wilaya=Alger").await);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/properties?wilaya=Alger")
            .to_request(),
    )
    .await;
    assert_eq!(json_body(resp).await["data"]["total"], 3);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/properties/{}", property_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["data"]["nearbyPlaces"][0]["name"], "Pharmacie");

    db.cleanup().await;
}
