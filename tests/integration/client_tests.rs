//! Request client behavior against a live mock server

use crate::common::{fast_client_config, league_page, match_document, t0};
use rank_harvester::config::{ApiConfig, ClientConfig};
use rank_harvester::riot::{
    Division, MatchIdQuery, Queue, QueueId, Region, RiotClient, Tier, HEADER_API_KEY,
    HEADER_RATE_LIMIT,
};
use rank_harvester::ApiError;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(server: &MockServer, client: ClientConfig) -> RiotClient {
    let api = ApiConfig {
        region: Region::Na1,
        base_url: Some(server.uri()),
    };
    RiotClient::new("RGAPI-test", &api, &client).unwrap()
}

#[tokio::test]
async fn test_league_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/lol/league-exp/v4/entries/RANKED_SOLO_5x5/DIAMOND/II",
        ))
        .and(query_param("page", "3"))
        .and(header(HEADER_API_KEY, "RGAPI-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(league_page(
            "p",
            2,
            "DIAMOND",
            "II",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    let entries = client
        .get_league(Queue::RankedSolo5x5, Tier::Diamond, Division::II, 3)
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].puuid, "p-0");
    assert_eq!(entries[0].tier, Tier::Diamond);
    assert_eq!(entries[0].division, Division::II);
    assert_eq!(entries[0].extra["leaguePoints"], 1000);
}

#[tokio::test]
async fn test_match_ids_request_sends_only_given_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/by-puuid/abc/ids"))
        .and(query_param("startTime", "1700000000"))
        .and(query_param("queue", "420"))
        .and(query_param("start", "0"))
        .and(query_param("count", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec!["NA1_1", "NA1_2"]))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    let query = MatchIdQuery {
        start_time: Some(1_700_000_000),
        queue: Some(QueueId::RankedSolo5x5),
        count: 20,
        ..MatchIdQuery::default()
    };
    let ids = client.get_match_ids("abc", &query).await.unwrap();
    assert_eq!(ids, vec!["NA1_1".to_string(), "NA1_2".to_string()]);

    let requests = server.received_requests().await.unwrap();
    let query_string = requests[0].url.query().unwrap_or_default();
    assert!(!query_string.contains("endTime"));
    assert!(!query_string.contains("type"));
}

#[tokio::test]
async fn test_retry_after_is_honored() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_document("NA1_1", t0())))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    let started = Instant::now();
    let document = client.get_match("NA1_1").await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(document["metadata"]["matchId"], "NA1_1");
}

#[tokio::test]
async fn test_retries_exhausted_after_six_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    let error = client.get_match("NA1_1").await.unwrap_err();

    assert!(
        matches!(error, ApiError::RetriesExhausted { attempts: 6, .. }),
        "expected RetriesExhausted, got {:?}",
        error
    );
    assert_eq!(error.status(), Some(503));
}

#[tokio::test]
async fn test_undecodable_body_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/by-puuid/abc/ids"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/by-puuid/abc/ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec!["NA1_9"]))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    let ids = client
        .get_match_ids("abc", &MatchIdQuery::default())
        .await
        .unwrap();
    assert_eq!(ids, vec!["NA1_9".to_string()]);
}

#[tokio::test]
async fn test_rate_limit_header_arms_limiter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(HEADER_RATE_LIMIT, "20:1,100:120")
                .insert_header("X-App-Rate-Limit-Count", "1:1,1:120")
                .set_body_json(match_document("NA1_1", t0())),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    assert!(client.limiter().rules().is_empty());

    client.get_match("NA1_1").await.unwrap();
    assert_eq!(client.limiter().rules().get(&1), Some(&20));
    assert_eq!(client.limiter().rules().get(&120), Some(&100));
    // The request that carried the declaration counts against it.
    assert_eq!(client.limiter().recorded(120), 1);

    client.get_match("NA1_1").await.unwrap();
    assert_eq!(client.limiter().recorded(120), 2);
}

#[tokio::test]
async fn test_declaring_request_counts_toward_first_window() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(HEADER_RATE_LIMIT, "2:1")
                .set_body_json(match_document("NA1_1", t0())),
        )
        .expect(3)
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    let started = Instant::now();
    for _ in 0..3 {
        client.get_match("NA1_1").await.unwrap();
    }

    // Only two requests fit in one second, the first one included.
    assert!(
        started.elapsed() >= Duration::from_secs(1),
        "3 requests sent within {:?} under 2:1",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_rate_limit_header_read_from_error_responses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header(HEADER_RATE_LIMIT, "5:1")
                .insert_header("Retry-After", "0"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_document("NA1_1", t0())))
        .mount(&server)
        .await;

    let mut client = create_client(&server, fast_client_config());
    client.get_match("NA1_1").await.unwrap();

    assert_eq!(client.limiter().rules().get(&1), Some(&5));
    // The rejected request and its retry
    assert_eq!(client.limiter().recorded(1), 2);
}

#[tokio::test]
async fn test_no_retries_when_disabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client_config = ClientConfig {
        max_retries: 0,
        ..fast_client_config()
    };
    let mut client = create_client(&server, client_config);
    let result = client.get_match("NA1_404").await;

    assert!(matches!(
        result,
        Err(ApiError::RetriesExhausted { attempts: 1, .. })
    ));
}
