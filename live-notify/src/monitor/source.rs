//! Batch live-status queries.
//!
//! The Bilibili `getRoomBaseInfo` endpoint accepts any number of repeated
//! `room_ids` parameters, so one request covers every watched room.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::models::RoomBaseInfoResponse;
use crate::utils::http_client::header_map;
use crate::{Error, Result};

/// `live_status` value the upstream uses for "currently streaming".
const UPSTREAM_LIVE: i64 = 1;

const REQ_BIZ: &str = "web_room_componet";
const REFERER: &str = "https://live.bilibili.com/";
const ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Live status of a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LiveStatus {
    /// Not observed yet.
    #[default]
    Unknown,
    Offline,
    Live,
}

impl LiveStatus {
    /// Map the upstream `live_status` code. Anything but 1 (including 2,
    /// the replay/rotation mode) counts as offline.
    pub fn from_code(code: i64) -> Self {
        if code == UPSTREAM_LIVE {
            LiveStatus::Live
        } else {
            LiveStatus::Offline
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, LiveStatus::Live)
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveStatus::Unknown => write!(f, "unknown"),
            LiveStatus::Offline => write!(f, "offline"),
            LiveStatus::Live => write!(f, "live"),
        }
    }
}

/// Status and metadata of one room, fresh from the current poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub status: LiveStatus,
    pub cover_url: String,
    pub display_name: String,
    pub room_url: String,
}

/// Source of per-room live status, queried once per poll cycle.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the status of all `room_ids` in a single request.
    ///
    /// The returned map is keyed by the requested ids. Rooms missing from
    /// the upstream reply are omitted. Any transport, HTTP, payload or API-level failure fails the
    /// whole batch with [`Error::Upstream`].
    async fn fetch_batch(&self, room_ids: &[String]) -> Result<HashMap<String, RoomSnapshot>>;
}

/// [`StatusSource`] backed by the Bilibili live web API.
pub struct BilibiliStatusSource {
    client: Client,
    api_url: String,
}

impl BilibiliStatusSource {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn query_params(room_ids: &[String]) -> Vec<(&'static str, &str)> {
        let mut params = Vec::with_capacity(room_ids.len() + 1);
        params.push(("req_biz", REQ_BIZ));
        params.extend(room_ids.iter().map(|id| ("room_ids", id.as_str())));
        params
    }

    /// Key every room of the reply under each requested id that names it.
    ///
    /// The upstream keys `by_room_ids` by the real room id, so a room
    /// configured by its short id is matched through `short_id`.
    fn parse_response(
        body: RoomBaseInfoResponse,
        requested: &[String],
    ) -> Result<HashMap<String, RoomSnapshot>> {
        if body.code != 0 {
            return Err(Error::upstream(format!(
                "API returned code {}: {}",
                body.code, body.message
            )));
        }

        let rooms = body
            .data
            .and_then(|data| data.by_room_ids)
            .unwrap_or_default();

        let mut snapshots = HashMap::with_capacity(requested.len());
        for (key, info) in &rooms {
            let status = LiveStatus::from_code(info.live_status);
            for room_id in requested.iter().filter(|id| info.answers(key, id)) {
                let snapshot = RoomSnapshot {
                    room_id: room_id.clone(),
                    status,
                    cover_url: info.cover.clone().unwrap_or_default(),
                    display_name: info.uname.clone(),
                    room_url: info.live_url.clone(),
                };
                snapshots.insert(room_id.clone(), snapshot);
            }
        }

        Ok(snapshots)
    }
}

#[async_trait]
impl StatusSource for BilibiliStatusSource {
    async fn fetch_batch(&self, room_ids: &[String]) -> Result<HashMap<String, RoomSnapshot>> {
        if room_ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!("Querying live status for {} rooms", room_ids.len());

        let headers = header_map(&[("accept", ACCEPT), ("referer", REFERER)]);

        let response = self
            .client
            .get(&self.api_url)
            .headers(headers)
            .query(&Self::query_params(room_ids))
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Status request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "Status request returned HTTP {}",
                status
            )));
        }

        let body: RoomBaseInfoResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Malformed status payload: {}", e)))?;

        let snapshots = Self::parse_response(body, room_ids)?;

        let missing = room_ids
            .iter()
            .filter(|id| !snapshots.contains_key(id.as_str()))
            .count();
        if missing > 0 {
            warn!(
                missing,
                requested = room_ids.len(),
                "Status reply omitted some rooms"
            );
        }

        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn client() -> Client {
        crate::utils::http_client::install_rustls_provider();
        Client::new()
    }

    fn source_for(server: &MockServer) -> BilibiliStatusSource {
        BilibiliStatusSource::new(
            client(),
            format!("{}/xlive/web-room/v1/index/getRoomBaseInfo", server.uri()),
        )
    }

    #[rstest]
    #[case(0, LiveStatus::Offline)]
    #[case(1, LiveStatus::Live)]
    #[case(2, LiveStatus::Offline)]
    #[case(-1, LiveStatus::Offline)]
    fn test_status_from_code(#[case] code: i64, #[case] expected: LiveStatus) {
        assert_eq!(LiveStatus::from_code(code), expected);
    }

    #[test]
    fn test_default_status_is_unknown() {
        assert_eq!(LiveStatus::default(), LiveStatus::Unknown);
        assert!(!LiveStatus::Unknown.is_live());
    }

    #[test]
    fn test_query_params_repeat_room_ids() {
        let room_ids = ids(&["1", "2"]);
        let params = BilibiliStatusSource::query_params(&room_ids);
        assert_eq!(
            params,
            vec![("req_biz", REQ_BIZ), ("room_ids", "1"), ("room_ids", "2")]
        );
    }

    #[tokio::test]
    async fn test_fetch_batch_parses_rooms() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xlive/web-room/v1/index/getRoomBaseInfo"))
            .and(query_param("req_biz", REQ_BIZ))
            .and(header("referer", REFERER))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "message": "0",
                "data": { "by_room_ids": {
                    "100": { "live_status": 1, "cover": "http://i0.hdslb.com/a.jpg", "uname": "Alice", "live_url": "https://live.bilibili.com/100" },
                    "200": { "live_status": 0, "uname": "Bob", "live_url": "https://live.bilibili.com/200" }
                } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = source_for(&server)
            .fetch_batch(&ids(&["100", "200", "300"]))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        let alice = &result["100"];
        assert_eq!(alice.status, LiveStatus::Live);
        assert_eq!(alice.display_name, "Alice");
        assert_eq!(alice.cover_url, "http://i0.hdslb.com/a.jpg");
        let bob = &result["200"];
        assert_eq!(bob.status, LiveStatus::Offline);
        assert_eq!(bob.cover_url, "");
        assert!(!result.contains_key("300"));
    }

    #[tokio::test]
    async fn test_fetch_batch_matches_short_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("room_ids", "6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "message": "0",
                "data": { "by_room_ids": {
                    "7734200": {
                        "room_id": 7734200, "short_id": 6, "live_status": 1,
                        "uname": "LPL", "live_url": "https://live.bilibili.com/6"
                    }
                } }
            })))
            .mount(&server)
            .await;

        let result = source_for(&server)
            .fetch_batch(&ids(&["6"]))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        let room = &result["6"];
        assert_eq!(room.room_id, "6");
        assert_eq!(room.status, LiveStatus::Live);
        assert_eq!(room.display_name, "LPL");
    }

    #[test]
    fn test_parse_response_drops_unrequested_rooms() {
        let body: RoomBaseInfoResponse = serde_json::from_value(serde_json::json!({
            "code": 0,
            "data": { "by_room_ids": {
                "1": { "live_status": 1, "uname": "a", "live_url": "u" },
                "2": { "room_id": 2, "short_id": 0, "live_status": 1, "uname": "b", "live_url": "u" }
            } }
        }))
        .unwrap();

        let result = BilibiliStatusSource::parse_response(body, &ids(&["1", "0"])).unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains_key("1"));
    }

    #[tokio::test]
    async fn test_fetch_batch_api_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": -400,
                "message": "request error",
                "data": null
            })))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .fetch_batch(&ids(&["100"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("-400"));
    }

    #[tokio::test]
    async fn test_fetch_batch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(412))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .fetch_batch(&ids(&["100"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_fetch_batch_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .fetch_batch(&ids(&["100"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_fetch_batch_null_data_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "message": "0",
                "data": { "by_room_ids": null }
            })))
            .mount(&server)
            .await;

        let result = source_for(&server)
            .fetch_batch(&ids(&["100"]))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_batch_timeout_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        crate::utils::http_client::install_rustls_provider();
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        let source = BilibiliStatusSource::new(client, server.uri());

        let err = source.fetch_batch(&ids(&["100"])).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_fetch_batch_empty_input_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let result = source_for(&server).fetch_batch(&[]).await.unwrap();
        assert!(result.is_empty());
    }
}
