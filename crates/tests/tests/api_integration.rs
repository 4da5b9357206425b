use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use wayfarer_api::build_app;

async fn app() -> Router {
    // Point the weather client at a closed port so plans use the simulated
    // forecast instead of the live source.
    std::env::set_var("WAYFARER_WEATHER_BASE_URL", "http://127.0.0.1:9");
    build_app().await.expect("app should build")
}

fn chat_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-wayfarer-key")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["status"], "ok");
    assert!(parsed["supported_cities"]
        .as_str()
        .unwrap()
        .contains("Mumbai"));
}

#[tokio::test]
async fn chat_requires_api_key() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": "trip to goa" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn incomplete_chat_asks_for_the_missing_slots() {
    let app = app().await;

    let response = app
        .oneshot(chat_request(json!({ "text": "plan a trip to goa" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert!(parsed["plan"].is_null());
    let missing: Vec<String> = parsed["missing_slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot.as_str().unwrap().to_string())
        .collect();
    assert_eq!(missing, vec!["source", "num_days"]);
    assert!(parsed["reply_text"].as_str().unwrap().contains("Where from?"));
}

#[tokio::test]
async fn context_carries_across_turns_in_one_session() {
    let app = app().await;

    let first = app
        .clone()
        .oneshot(chat_request(
            json!({ "session_id": "trip-1", "text": "plan a trip to goa" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(chat_request(
            json!({ "session_id": "trip-1", "text": "from mumbai, 3 days, under 15k" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let parsed = json_body(second).await;
    assert_eq!(parsed["context"]["source"], "Mumbai");
    assert_eq!(parsed["context"]["destination"], "Goa");
    assert_eq!(parsed["plan"]["outcome"], "success");
}

#[tokio::test]
async fn full_utterance_plans_within_budget() {
    let app = app().await;

    let response = app
        .oneshot(chat_request(
            json!({ "text": "3 day trip Mumbai to Goa under 15k" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["plan"]["outcome"], "success");
    let total = parsed["plan"]["budget"]["grand_total"].as_i64().unwrap();
    assert!(total <= 15_000, "total {total} exceeds the stated budget");
    assert!(parsed["plan"]["budget"]["savings"].as_i64().unwrap() >= 0);
    assert_eq!(parsed["plan"]["itinerary"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn plan_endpoint_reports_budget_too_low_as_data() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/plan")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-wayfarer-key")
        .body(Body::from(
            json!({
                "source": "mumbai",
                "destination": "goa",
                "num_days": 3,
                "budget_tier": "budget",
                "max_budget": 6000
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["outcome"], "failure");
    assert_eq!(parsed["kind"], "budget_too_low");
    assert!(parsed["suggestion"].as_str().unwrap().contains("₹11,900"));
    assert!(parsed["analysis"]["per_night_available"].as_i64().unwrap() < 1_000);
}

#[tokio::test]
async fn plan_endpoint_rejects_unknown_cities() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/plan")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-wayfarer-key")
        .body(Body::from(
            json!({
                "source": "atlantis",
                "destination": "goa",
                "num_days": 3
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let parsed = json_body(response).await;
    assert_eq!(parsed["error"], "unknown_city");
}

#[tokio::test]
async fn plan_endpoint_rejects_out_of_range_counts() {
    let app = app().await;

    let zero_days = Request::builder()
        .method("POST")
        .uri("/v1/plan")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-wayfarer-key")
        .body(Body::from(
            json!({
                "source": "mumbai",
                "destination": "goa",
                "num_days": 0
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(zero_days).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let parsed = json_body(response).await;
    assert_eq!(parsed["error"], "out_of_range");
    assert!(parsed["message"].as_str().unwrap().contains("num_days"));

    let zero_travelers = Request::builder()
        .method("POST")
        .uri("/v1/plan")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-wayfarer-key")
        .body(Body::from(
            json!({
                "source": "mumbai",
                "destination": "goa",
                "num_days": 3,
                "num_travelers": 0
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(zero_travelers).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let parsed = json_body(response).await;
    assert_eq!(parsed["error"], "out_of_range");
    assert!(parsed["message"].as_str().unwrap().contains("num_travelers"));
}

#[tokio::test]
async fn unserved_route_comes_back_as_no_flight_route() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/plan")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-wayfarer-key")
        .body(Body::from(
            json!({
                "source": "jaipur",
                "destination": "goa",
                "num_days": 2
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["outcome"], "failure");
    assert_eq!(parsed["kind"], "no_flight_route");
    assert!(parsed["suggestion"].as_str().unwrap().contains("Delhi"));
}
