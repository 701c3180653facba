mod common;

use common::*;
use rapport::api::v1::{ACTING_USER_HEADER, recover_error, routes};
use rapport::domain_model::*;
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

fn api(
    server: Arc<rapport::server::Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    routes(server).recover(recover_error)
}

fn body<B: AsRef<[u8]>>(response: &warp::http::Response<B>) -> Value {
    serde_json::from_slice(response.body().as_ref()).expect("json body")
}

#[tokio::test]
async fn requests_without_an_acting_user_are_unauthenticated() {
    let (server, _) = server();
    let api = api(server);

    let response = warp::test::request()
        .method("GET")
        .path("/friends")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body(&response);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("Unauthenticated"));

    let response = warp::test::request()
        .method("GET")
        .path("/friends")
        .header(ACTING_USER_HEADER, "not-a-uuid")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn friend_request_accepted_over_http() {
    let (server, _) = server();
    let api = api(server.clone());
    let (a, b) = (user(), user());

    let response = warp::test::request()
        .method("POST")
        .path("/friends/requests")
        .header(ACTING_USER_HEADER, a.to_string())
        .json(&json!({ "receiver": b }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let request = body(&response);
    let notification_id = request["data"]["notification_id"]
        .as_str()
        .expect("notification id")
        .to_owned();

    // only the receiver may accept
    let response = warp::test::request()
        .method("POST")
        .path(&format!("/friends/requests/{notification_id}/accept"))
        .header(ACTING_USER_HEADER, a.to_string())
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = warp::test::request()
        .method("POST")
        .path(&format!("/friends/requests/{notification_id}/accept"))
        .header(ACTING_USER_HEADER, b.to_string())
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let accepted = body(&response);
    assert_eq!(accepted["data"]["kind"], json!("private"));

    let response = warp::test::request()
        .method("GET")
        .path("/friends")
        .header(ACTING_USER_HEADER, a.to_string())
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(&response)["data"], json!([b]));

    // a second request between friends conflicts
    let response = warp::test::request()
        .method("POST")
        .path("/friends/requests")
        .header(ACTING_USER_HEADER, b.to_string())
        .json(&json!({ "receiver": a }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    server.shutdown().await;
}

#[tokio::test]
async fn outsiders_cannot_read_a_conversation() {
    let (server, _) = server();
    let api = api(server.clone());
    let (a, b, outsider) = (user(), user(), user());

    let response = warp::test::request()
        .method("POST")
        .path("/conversations/private")
        .header(ACTING_USER_HEADER, a.to_string())
        .json(&json!({ "peer": b }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let opened = body(&response);
    assert_eq!(opened["data"]["created"], json!(true));
    let conversation_id = opened["data"]["conversation"]["conversation_id"]
        .as_str()
        .expect("conversation id")
        .to_owned();

    let members_path = format!("/conversations/{conversation_id}/members");
    let response = warp::test::request()
        .method("GET")
        .path(&members_path)
        .header(ACTING_USER_HEADER, outsider.to_string())
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = warp::test::request()
        .method("GET")
        .path(&members_path)
        .header(ACTING_USER_HEADER, b.to_string())
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let members = body(&response);
    assert_eq!(members["data"].as_array().map(Vec::len), Some(2));

    server.shutdown().await;
}

#[tokio::test]
async fn malformed_bodies_and_unknown_notifications() {
    let (server, _) = server();
    let api = api(server);
    let a = user();

    let response = warp::test::request()
        .method("POST")
        .path("/friends/requests")
        .header(ACTING_USER_HEADER, a.to_string())
        .header("content-type", "application/json")
        .body("{\"receiver\": 7}")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing = NotificationId(uuid::Uuid::new_v4());
    let response = warp::test::request()
        .method("POST")
        .path(&format!("/notifications/{missing}/read"))
        .header(ACTING_USER_HEADER, a.to_string())
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
