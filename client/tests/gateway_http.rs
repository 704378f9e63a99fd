//! Gateway behavior against a stubbed HTTP host.
//!
//! Covers both response shapes, the status-to-error mapping, the auth
//! handshake endpoints, and a session reacting to a rejected token.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridcal_client::config::{Config, GatewayConfig};
use gridcal_client::errors::CalendarError;
use gridcal_client::event::EventTime;
use gridcal_client::gateway::{EventSource, EventsGateway, HttpEventsGateway};
use gridcal_client::session::{SessionManager, SessionState};
use gridcal_client::token_store::{MemoryTokenStore, TokenStore};

// ============================================================================
// Test Helpers
// ============================================================================

fn gateway_config(server: &MockServer, use_mock: bool) -> GatewayConfig {
    GatewayConfig {
        base_url: server.uri(),
        use_mock,
        ..Config::default().gateway
    }
}

fn live_gateway(server: &MockServer) -> HttpEventsGateway {
    HttpEventsGateway::new(gateway_config(server, false), Duration::from_secs(5)).unwrap()
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_flattened_events_with_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calendar/events"))
        .and(query_param("accessToken", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                {
                    "id": "evt1",
                    "title": "Team Meeting",
                    "start": "2024-03-05T14:00:00.000Z",
                    "end": "2024-03-05T15:00:00.000Z",
                    "isAllDay": false
                },
                {
                    "id": "evt2",
                    "title": "Holiday",
                    "start": "2024-03-08T00:00:00.000Z",
                    "end": "2024-03-09T00:00:00.000Z",
                    "isAllDay": true
                }
            ]
        })))
        .mount(&server)
        .await;

    let gateway = live_gateway(&server);
    assert_eq!(gateway.source(), EventSource::Live);
    assert!(gateway.requires_token());

    let events = gateway.get_events("tok-123").await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0].start,
        Some(EventTime::Instant(Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap()))
    );
    assert_eq!(events[1].start, Some(EventTime::Date("2024-03-08".to_string())));
    assert!(events[1].is_all_day);
}

#[tokio::test]
async fn test_nested_events_from_mock_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calendar/simple"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "m1",
                    "summary": "Lunch",
                    "start": { "dateTime": "2024-03-05T12:00:00Z" },
                    "end": { "dateTime": "2024-03-05T13:00:00Z" }
                },
                {
                    "start": { "date": "2024-03-10" },
                    "end": { "date": "2024-03-11" }
                }
            ]
        })))
        .mount(&server)
        .await;

    let gateway =
        HttpEventsGateway::new(gateway_config(&server, true), Duration::from_secs(5)).unwrap();
    assert_eq!(gateway.source(), EventSource::Mock);
    assert!(!gateway.requires_token());

    let events = gateway.get_events("").await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Lunch");
    assert_eq!(events[1].title, "Untitled Event");
    assert!(!events[1].id.is_empty());
    assert!(events[1].is_all_day);
}

#[tokio::test]
async fn test_one_bad_record_keeps_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calendar/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                {"id": "good", "title": "Standup", "start": "2024-03-05T09:00:00Z"},
                {"id": "bad", "title": "Epoch", "start": 1709629200000u64}
            ]
        })))
        .mount(&server)
        .await;

    let events = live_gateway(&server).get_events("tok").await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0].start.is_some());
    assert!(events[1].start.is_none());
}

#[tokio::test]
async fn test_unauthorized_maps_to_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calendar/events"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Credentials"))
        .mount(&server)
        .await;

    let err = live_gateway(&server).get_events("dead").await.unwrap_err();
    assert_eq!(err, CalendarError::AuthExpired);
    assert!(err.requires_reconnect());
}

#[tokio::test]
async fn test_other_statuses_map_to_transport() {
    for status in [405u16, 500, 503] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/calendar/events"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = live_gateway(&server).get_events("tok").await.unwrap_err();
        assert!(
            matches!(err, CalendarError::Transport { .. }),
            "status {} gave {:?}",
            status,
            err
        );
        assert!(!err.requires_reconnect());
    }
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calendar/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = live_gateway(&server).get_events("tok").await.unwrap_err();
    assert!(matches!(err, CalendarError::Transport { .. }));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let server = MockServer::start().await;
    let config = gateway_config(&server, false);
    drop(server);

    let gateway = HttpEventsGateway::new(config, Duration::from_secs(2)).unwrap();
    let err = gateway.get_events("tok").await.unwrap_err();
    assert!(matches!(err, CalendarError::Transport { .. }));
}

// ============================================================================
// Authorization handshake
// ============================================================================

#[tokio::test]
async fn test_authorization_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authUrl": "https://accounts.example.com/o/oauth2/auth?client_id=abc"
        })))
        .mount(&server)
        .await;

    let url = live_gateway(&server).authorization_url().await.unwrap();
    assert!(url.starts_with("https://accounts.example.com/"));
}

#[tokio::test]
async fn test_exchange_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/google"))
        .and(body_json(json!({ "code": "4/abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "tokens": { "access_token": "ya29.fresh", "refresh_token": "1//r" }
        })))
        .mount(&server)
        .await;

    let exchange = live_gateway(&server).exchange_code("4/abc").await.unwrap();
    assert!(exchange.success);
    assert_eq!(exchange.access_token().as_deref(), Some("ya29.fresh"));
}

#[tokio::test]
async fn test_rejected_code_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/google"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = live_gateway(&server).exchange_code("bad").await.unwrap_err();
    assert_eq!(err, CalendarError::AuthFailed);
}

// ============================================================================
// Session against the gateway
// ============================================================================

#[tokio::test]
async fn test_rejected_token_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calendar/events"))
        .and(query_param("accessToken", "stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("stale"));
    let session = SessionManager::open(store.clone()).unwrap();
    assert_eq!(session.state(), SessionState::SignedIn);

    let gateway = live_gateway(&server);
    let err = session.fetch_events(&gateway).await.unwrap_err();

    assert_eq!(err, CalendarError::AuthExpired);
    assert_eq!(session.state(), SessionState::Expired);
    assert_eq!(session.token(), None);
    assert_eq!(store.load().unwrap(), None);

    // No token left, so the next fetch never reaches the host
    let err = session.fetch_events(&gateway).await.unwrap_err();
    assert_eq!(err, CalendarError::Unauthenticated);
}

#[tokio::test]
async fn test_signed_out_session_reads_mock_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calendar/simple"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let session = SessionManager::open(Arc::new(MemoryTokenStore::new())).unwrap();
    let gateway =
        HttpEventsGateway::new(gateway_config(&server, true), Duration::from_secs(5)).unwrap();

    let events = session.fetch_events(&gateway).await.unwrap();
    assert!(events.is_empty());
    assert_eq!(session.state(), SessionState::SignedOut);
}
