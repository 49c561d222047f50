use crate::wire::{
    AdminGamesResponse, AuditItem, AuditResponse, LeaderboardResponse, LeaderboardRow,
    WinnerResponse,
};
use crate::{Game, GameId, TeamId, WinnerUpdate};
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_GAMES_LIMIT: u32 = 200;
pub const DEFAULT_AUDIT_LIMIT: u32 = 10;
pub const DEFAULT_LEADERBOARD_TTL_SEC: u32 = 30;

const TEST_USER_HEADER: &str = "x-test-user-id";

/// Who the requests are made as. Handed to the client explicitly; nothing
/// reads identity from global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Bearer token from the identity provider.
    pub access_token: Option<String>,
    /// Dev-only fallback identity, sent only when no token is present.
    pub test_user_id: Option<String>,
}

impl Session {
    pub fn from_env() -> Self {
        Self {
            access_token: non_blank_env("POOL_ACCESS_TOKEN"),
            test_user_id: non_blank_env("POOL_TEST_USER_ID"),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.access_token.as_deref() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => warn!("ignoring malformed access token: {e}"),
            }
        } else if let Some(user_id) = self.test_user_id.as_deref() {
            match HeaderValue::from_str(user_id) {
                Ok(value) => {
                    headers.insert(TEST_USER_HEADER, value);
                }
                Err(e) => warn!("ignoring malformed test user id: {e}"),
            }
        }

        headers
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub session: Session,
    /// Local `AdminGamesResponse` JSON used instead of `GET /admin/games`.
    pub games_snapshot: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session: Session::default(),
            games_snapshot: None,
        }
    }
}

impl ClientConfig {
    /// `POOL_API_BASE_URL`, `POOL_ACCESS_TOKEN`, `POOL_TEST_USER_ID`, `POOL_GAMES_JSON`.
    pub fn from_env() -> Self {
        Self {
            base_url: non_blank_env("POOL_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            session: Session::from_env(),
            games_snapshot: non_blank_env("POOL_GAMES_JSON").map(PathBuf::from),
        }
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parameters for `GET /admin/games`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamesQuery {
    pub tournament_id: i64,
    pub league_id: i64,
    pub limit: u32,
    pub offset: u32,
}

impl GamesQuery {
    pub fn new(tournament_id: i64, league_id: i64) -> Self {
        Self { tournament_id, league_id, limit: DEFAULT_GAMES_LIMIT, offset: 0 }
    }
}

/// One page of games, already mapped to the domain model.
#[derive(Debug, Clone, Default)]
pub struct GamesPage {
    pub items: Vec<Game>,
    pub limit: u32,
    pub offset: u32,
}

impl From<AdminGamesResponse> for GamesPage {
    fn from(raw: AdminGamesResponse) -> Self {
        Self {
            items: raw.items.into_iter().map(Game::from).collect(),
            limit: raw.limit,
            offset: raw.offset,
        }
    }
}

/// Pool backend client.
#[derive(Debug, Clone)]
pub struct PoolApi {
    client: Client,
    base_url: Url,
    session: Session,
    games_snapshot: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api { context: &'static str, status: u16, url: String, body: String },
    /// The backend rejected a mutation because `expected_version` is stale.
    StaleVersion { context: &'static str, body: String },
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api { context, status, body, .. } => write!(f, "{context} ({status}): {body}"),
            ApiError::StaleVersion { context, body } => {
                write!(f, "{context} (409): game changed since it was loaded, refresh and retry: {body}")
            }
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl PoolApi {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Other(format!("invalid base url {}: {e}", config.base_url)))?;
        let client = Client::builder()
            .user_agent(concat!("poolbracket/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Other(format!("could not build http client: {e}")))?;
        Ok(Self { client, base_url, session: config.session, games_snapshot: config.games_snapshot })
    }

    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// `GET /admin/games`: the flat game list the bracket is rebuilt from.
    pub async fn fetch_admin_games(&self, query: GamesQuery) -> ApiResult<GamesPage> {
        if let Some(path) = self.games_snapshot.as_ref() {
            debug!("reading games snapshot from {}", path.display());
            let content = std::fs::read_to_string(path)
                .map_err(|e| ApiError::NotFound(format!("could not read {}: {e}", path.display())))?;
            let raw: AdminGamesResponse = serde_json::from_str(&content).map_err(|e| {
                ApiError::NotFound(format!("invalid games json at {}: {e}", path.display()))
            })?;
            return Ok(raw.into());
        }

        let url = self.url(
            "/admin/games",
            &[
                ("tournament_id", query.tournament_id.to_string()),
                ("league_id", query.league_id.to_string()),
                ("limit", query.limit.to_string()),
                ("offset", query.offset.to_string()),
            ],
        )?;
        let raw: AdminGamesResponse = self.send(Method::GET, url, "Admin games fetch failed").await?;
        Ok(raw.into())
    }

    /// `PATCH /admin/games/{id}/winner`.
    pub async fn set_winner(
        &self,
        game_id: GameId,
        winner_team_id: TeamId,
        league_id: i64,
        expected_version: Option<i64>,
    ) -> ApiResult<WinnerUpdate> {
        let mut query = vec![
            ("winner_team_id", winner_team_id.to_string()),
            ("league_id", league_id.to_string()),
        ];
        if let Some(v) = expected_version {
            query.push(("expected_version", v.to_string()));
        }
        let url = self.url(&format!("/admin/games/{game_id}/winner"), &query)?;
        let raw: WinnerResponse = self.send(Method::PATCH, url, "Set winner failed").await?;
        Ok(raw.into())
    }

    /// `PATCH /admin/games/{id}/undo-winner`.
    pub async fn undo_winner(
        &self,
        game_id: GameId,
        league_id: i64,
        expected_version: Option<i64>,
    ) -> ApiResult<WinnerUpdate> {
        let mut query = vec![("league_id", league_id.to_string())];
        if let Some(v) = expected_version {
            query.push(("expected_version", v.to_string()));
        }
        let url = self.url(&format!("/admin/games/{game_id}/undo-winner"), &query)?;
        let raw: WinnerResponse = self.send(Method::PATCH, url, "Undo winner failed").await?;
        Ok(raw.into())
    }

    /// `GET /admin/audit`: newest changes first, as the backend orders them.
    pub async fn fetch_audit(
        &self,
        tournament_id: i64,
        league_id: i64,
        limit: u32,
        offset: u32,
    ) -> ApiResult<Vec<AuditItem>> {
        let url = self.url(
            "/admin/audit",
            &[
                ("tournament_id", tournament_id.to_string()),
                ("league_id", league_id.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )?;
        let raw: AuditResponse = self.send(Method::GET, url, "Audit fetch failed").await?;
        Ok(raw.items)
    }

    /// League standings. Scoring happens server-side; `ttl_sec` lets the
    /// backend serve a cached computation.
    pub async fn fetch_leaderboard(
        &self,
        league_id: i64,
        tournament_id: i64,
        ttl_sec: u32,
    ) -> ApiResult<Vec<LeaderboardRow>> {
        let url = self.url(
            &format!("/commissioner/leagues/{league_id}/leaderboard"),
            &[("tournament_id", tournament_id.to_string()), ("ttl_sec", ttl_sec.to_string())],
        )?;
        let raw: LeaderboardResponse = self.send(Method::GET, url, "Leaderboard fetch failed").await?;
        Ok(raw.rows)
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Other(format!("invalid path {path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        context: &'static str,
    ) -> ApiResult<T> {
        let url_str = url.to_string();
        debug!("{method} {url_str}");
        let response = self
            .client
            .request(method, url)
            .headers(self.session.headers())
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url_str.clone()))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) if !text.is_empty() => text,
                _ => context.to_string(),
            };
            if status == StatusCode::CONFLICT {
                return Err(ApiError::StaleVersion { context, body });
            }
            return Err(ApiError::Api { context, status: status.as_u16(), url: url_str, body });
        }

        response.json::<T>().await.map_err(|e| ApiError::Parsing(e, url_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RegionName, Slot};
    use mockito::{Matcher, Server};

    fn api_for(server: &Server, session: Session) -> PoolApi {
        PoolApi::new(ClientConfig {
            base_url: server.url(),
            session,
            games_snapshot: None,
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = PoolApi::new(ClientConfig { base_url: "not a url".into(), ..ClientConfig::default() })
            .unwrap_err();
        assert!(matches!(err, ApiError::Other(_)));
    }

    #[test]
    fn test_bearer_token_takes_precedence_over_test_user() {
        let session = Session { access_token: Some("abc".into()), test_user_id: Some("7".into()) };
        let headers = session.headers();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert!(headers.get(TEST_USER_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_fetch_admin_games_sends_query_and_maps_items() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/games")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("tournament_id".into(), "3".into()),
                Matcher::UrlEncoded("league_id".into(), "9".into()),
                Matcher::UrlEncoded("limit".into(), "200".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
            ]))
            .match_header("accept", "application/json")
            .match_header("x-test-user-id", "42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items":[{"id":1,"tournament_id":3,"round_no":1,"game_index":1,
                    "team_a_id":10,"team_a_name":"Duke","team_a_seed":1,"team_a_region":"East",
                    "version":2,"region":"East"}],"limit":200,"offset":0}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server, Session { access_token: None, test_user_id: Some("42".into()) });
        let page = api.fetch_admin_games(GamesQuery::new(3, 9)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.items.len(), 1);
        let game = &page.items[0];
        assert!(game.belongs_to(RegionName::East));
        assert_eq!(game.slot_a.participant().map(|p| p.name.as_str()), Some("Duke"));
        assert_eq!(game.slot_b, Slot::Empty { seed: None });
    }

    #[tokio::test]
    async fn test_set_winner_passes_expected_version() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/admin/games/17/winner")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("winner_team_id".into(), "101".into()),
                Matcher::UrlEncoded("league_id".into(), "9".into()),
                Matcher::UrlEncoded("expected_version".into(), "4".into()),
            ]))
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"game_id":17,"winner_team_id":101,"version":5}"#)
            .create_async()
            .await;

        let api = api_for(&server, Session { access_token: Some("tok".into()), test_user_id: None });
        let update = api.set_winner(17, 101, 9, Some(4)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(update, WinnerUpdate { game_id: 17, winner_team_id: Some(101), version: 5 });
    }

    #[tokio::test]
    async fn test_undo_winner_without_version_omits_parameter() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/admin/games/17/undo-winner")
            .match_query(Matcher::Exact("league_id=9".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"game_id":17,"winner_team_id":null,"version":6}"#)
            .create_async()
            .await;

        let api = api_for(&server, Session::default());
        let update = api.undo_winner(17, 9, None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(update.winner_team_id, None);
        assert_eq!(update.version, 6);
    }

    #[tokio::test]
    async fn test_stale_version_maps_to_dedicated_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/admin/games/17/winner")
            .match_query(Matcher::Any)
            .with_status(409)
            .with_body("version mismatch")
            .create_async()
            .await;

        let api = api_for(&server, Session::default());
        let err = api.set_winner(17, 101, 9, Some(1)).await.unwrap_err();
        match err {
            ApiError::StaleVersion { body, .. } => assert_eq!(body, "version mismatch"),
            other => panic!("expected StaleVersion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_message_includes_context_and_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/admin/audit")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("not a commissioner")
            .create_async()
            .await;

        let api = api_for(&server, Session::default());
        let err = api.fetch_audit(3, 9, DEFAULT_AUDIT_LIMIT, 0).await.unwrap_err();
        assert_eq!(err.to_string(), "Audit fetch failed (403): not a commissioner");
    }

    #[tokio::test]
    async fn test_empty_error_body_falls_back_to_context() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/admin/games")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let api = api_for(&server, Session::default());
        let err = api.fetch_admin_games(GamesQuery::new(3, 9)).await.unwrap_err();
        assert_eq!(err.to_string(), "Admin games fetch failed (500): Admin games fetch failed");
    }

    #[tokio::test]
    async fn test_fetch_leaderboard_returns_rows() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/commissioner/leagues/9/leaderboard")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("tournament_id".into(), "3".into()),
                Matcher::UrlEncoded("ttl_sec".into(), "30".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"rows":[{"user_id":1,"points":12,"teams_alive":3,"team_wins":6,"rank":1,"display_name":"Pat"},
                    {"user_id":2,"points":8,"teams_alive":4,"team_wins":4,"rank":2}]}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server, Session::default());
        let rows = api.fetch_leaderboard(9, 3, DEFAULT_LEADERBOARD_TTL_SEC).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name(), "Pat");
        assert_eq!(rows[1].name(), "User 2");
    }

    #[tokio::test]
    async fn test_games_snapshot_file_bypasses_network() {
        let path = std::env::temp_dir().join(format!("pool-api-snapshot-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"items":[{"id":4,"tournament_id":1,"round_no":1,"game_index":2,"version":0,"region":"West"}],"limit":200,"offset":0}"#,
        )
        .unwrap();

        let api = PoolApi::new(ClientConfig {
            base_url: "http://127.0.0.1:9".into(),
            session: Session::default(),
            games_snapshot: Some(path.clone()),
        })
        .unwrap();
        let page = api.fetch_admin_games(GamesQuery::new(1, 1)).await.unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].game_index, 2);
    }
}
