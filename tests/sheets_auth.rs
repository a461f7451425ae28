/// Spreadsheet access token renewal against mocked token and Sheets endpoints
use rdv_dashboard::config::{Config, SpreadsheetCredentials};
use rdv_dashboard::errors::AppError;
use rdv_dashboard::sheets_client::{GoogleSheetsClient, RowSource};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHEET_PATH: &str = "/v4/spreadsheets/sheet-123/values/RDV!A1:J1000";

fn refreshing_config(mock_server: &MockServer) -> Config {
    Config {
        port: 3000,
        webhook_url: None,
        spreadsheet_id: "sheet-123".to_string(),
        range: "RDV!A1:J1000".to_string(),
        spreadsheet_credentials: SpreadsheetCredentials::RefreshToken {
            client_id: "client-1.apps.googleusercontent.com".to_string(),
            client_secret: Some("client-secret".to_string()),
            refresh_token: "refresh-abc".to_string(),
            token_uri: format!("{}/token", mock_server.uri()),
        },
        sheets_api_base_url: mock_server.uri(),
        http_timeout_secs: 5,
    }
}

fn token_reply(access_token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "expires_in": expires_in,
        "token_type": "Bearer"
    }))
}

fn sheet_reply() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "range": "RDV!A1:J1000",
        "values": [["ID", "Sales (MS)"], ["1", "Alice"]]
    }))
}

#[tokio::test]
async fn test_token_obtained_before_first_sheet_call_and_reused() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-abc"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(token_reply("fresh-token", 3600))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(sheet_reply())
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = GoogleSheetsClient::new(&refreshing_config(&mock_server)).unwrap();
    let rows = client.fetch_rows().await.unwrap().unwrap();
    assert_eq!(rows[1], vec!["1", "Alice"]);
    client.fetch_rows().await.unwrap();
}

#[tokio::test]
async fn test_token_near_expiry_is_refreshed_before_sheet_call() {
    let mock_server = MockServer::start().await;
    // First grant is already inside the refresh margin
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_reply("short-lived", 30))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_reply("renewed", 3600))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(header("authorization", "Bearer short-lived"))
        .respond_with(sheet_reply())
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(header("authorization", "Bearer renewed"))
        .respond_with(sheet_reply())
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GoogleSheetsClient::new(&refreshing_config(&mock_server)).unwrap();
    client.fetch_rows().await.unwrap();
    client.fetch_rows().await.unwrap();
}

#[tokio::test]
async fn test_rejected_token_is_replaced_on_next_fetch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_reply("revoked", 3600))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_reply("renewed", 3600))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(header("authorization", "Bearer renewed"))
        .respond_with(sheet_reply())
        .mount(&mock_server)
        .await;

    let client = GoogleSheetsClient::new(&refreshing_config(&mock_server)).unwrap();
    let err = client.fetch_rows().await.unwrap_err();
    assert!(matches!(err, AppError::Upstream { status: 401, .. }));

    let rows = client.fetch_rows().await.unwrap();
    assert!(rows.is_some());
}

#[tokio::test]
async fn test_failed_refresh_skips_sheet_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(sheet_reply())
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = GoogleSheetsClient::new(&refreshing_config(&mock_server)).unwrap();
    let err = client.fetch_rows().await.unwrap_err();
    assert!(matches!(err, AppError::Transport(_)));
}
