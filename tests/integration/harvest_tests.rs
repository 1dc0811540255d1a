//! End-to-end harvest loop tests
//!
//! The loop runs against a wiremock server, an in-memory database, and a
//! manual clock so every scheduling decision is deterministic.

use crate::common::{create_test_config, league_page, match_document, t0, LEAGUE_PREFIX};
use chrono::Duration;
use rank_harvester::clock::ManualClock;
use rank_harvester::crawler::{Harvester, Step};
use rank_harvester::riot::Tier;
use rank_harvester::storage::{SqliteStorage, StorageStats};
use rank_harvester::{ApiError, HarvestError};
use serde_json::Value;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_harvester(server: &MockServer, tiers: Vec<Tier>, clock: &ManualClock) -> Harvester<SqliteStorage> {
    Harvester::new(
        create_test_config(&server.uri(), tiers),
        "RGAPI-test",
        SqliteStorage::new_in_memory().unwrap(),
        Arc::new(clock.clone()),
    )
    .unwrap()
}

async fn mount_league_page(server: &MockServer, tier: &str, rank: &str, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}/{}", LEAGUE_PREFIX, tier, rank)))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_match_ids(server: &MockServer, puuid: &str, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/lol/match/v5/matches/by-puuid/{}/ids", puuid)))
        .respond_with(ResponseTemplate::new(200).set_body_json(ids))
        .mount(server)
        .await;
}

async fn mount_match(server: &MockServer, match_id: &str, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/lol/match/v5/matches/{}", match_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_document(match_id, t0())))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_apex_tier_pages_until_empty() {
    let server = MockServer::start().await;
    mount_league_page(&server, "CHALLENGER", "I", 1, league_page("a", 10, "CHALLENGER", "I")).await;
    mount_league_page(&server, "CHALLENGER", "I", 2, league_page("b", 10, "CHALLENGER", "I")).await;
    mount_league_page(&server, "CHALLENGER", "I", 3, Value::Array(vec![])).await;

    let clock = ManualClock::new(t0());
    let mut harvester = create_harvester(&server, vec![Tier::Challenger], &clock);

    let step = harvester.step().await.unwrap();
    assert_eq!(
        step,
        Step::RosterRefreshed {
            pages: 2,
            entries: 20,
            players: 20
        }
    );
    assert_eq!(harvester.registry().len(), 20);
    assert_eq!(harvester.last_roster_refresh(), Some(t0()));
    assert_eq!(harvester.storage().count_roster_rows().unwrap(), 20);

    // Only division I was requested for an apex tier.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|r| r.url.path().ends_with("/CHALLENGER/I")));
}

#[tokio::test]
async fn test_divided_tier_visits_every_division_after_apex() {
    let server = MockServer::start().await;
    mount_league_page(&server, "MASTER", "I", 1, league_page("m", 1, "MASTER", "I")).await;
    mount_league_page(&server, "MASTER", "I", 2, Value::Array(vec![])).await;
    for rank in ["I", "II", "III", "IV"] {
        let prefix = format!("d{}", rank);
        mount_league_page(&server, "DIAMOND", rank, 1, league_page(&prefix, 1, "DIAMOND", rank)).await;
        mount_league_page(&server, "DIAMOND", rank, 2, Value::Array(vec![])).await;
    }

    let clock = ManualClock::new(t0());
    let mut harvester = create_harvester(&server, vec![Tier::Diamond, Tier::Master], &clock);
    harvester.step().await.unwrap();

    let order: Vec<&str> = harvester
        .registry()
        .players()
        .iter()
        .map(|p| p.puuid.as_str())
        .collect();
    assert_eq!(order, vec!["m-0", "dI-0", "dII-0", "dIII-0", "dIV-0"]);

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert!(paths[0].ends_with("/MASTER/I"));
    assert!(paths[2].ends_with("/DIAMOND/I"));
    assert!(paths[9].ends_with("/DIAMOND/IV"));
}

#[tokio::test]
async fn test_shared_match_fetched_once() {
    let server = MockServer::start().await;
    let mut page = league_page("p", 2, "CHALLENGER", "I");
    page[0]["puuid"] = "alice".into();
    page[1]["puuid"] = "bob".into();
    mount_league_page(&server, "CHALLENGER", "I", 1, page).await;
    mount_league_page(&server, "CHALLENGER", "I", 2, Value::Array(vec![])).await;

    let window_start = (t0() - Duration::days(7)).timestamp();
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/by-puuid/alice/ids"))
        .and(query_param("startTime", window_start.to_string()))
        .and(query_param("queue", "420"))
        .and(query_param("count", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(["NA1_1", "NA1_2"]))
        .expect(1)
        .mount(&server)
        .await;
    mount_match_ids(&server, "bob", &["NA1_2", "NA1_3"]).await;
    mount_match(&server, "NA1_1", 1).await;
    mount_match(&server, "NA1_2", 1).await;
    mount_match(&server, "NA1_3", 1).await;

    let clock = ManualClock::new(t0());
    let mut harvester = create_harvester(&server, vec![Tier::Challenger], &clock);
    harvester.step().await.unwrap();

    let first = harvester.step().await.unwrap();
    assert_eq!(
        first,
        Step::PlayerPolled {
            puuid: "alice".to_string(),
            match_ids: 2,
            new_matches: 2
        }
    );

    clock.advance(Duration::minutes(1));
    let second = harvester.step().await.unwrap();
    assert_eq!(
        second,
        Step::PlayerPolled {
            puuid: "bob".to_string(),
            match_ids: 2,
            new_matches: 1
        }
    );

    assert_eq!(harvester.ledger().len(), 3);
    assert_eq!(harvester.storage().count_matches().unwrap(), 3);

    let bob = harvester.registry().get("bob").unwrap();
    let harvest = bob.last_harvest.unwrap();
    assert_eq!(harvest.match_count, 2);
    assert_eq!(harvest.at, t0() + Duration::minutes(1));
}

#[tokio::test]
async fn test_player_without_new_matches_still_stamped() {
    let server = MockServer::start().await;
    mount_league_page(&server, "CHALLENGER", "I", 1, league_page("p", 1, "CHALLENGER", "I")).await;
    mount_league_page(&server, "CHALLENGER", "I", 2, Value::Array(vec![])).await;
    mount_match_ids(&server, "p-0", &[]).await;

    let clock = ManualClock::new(t0());
    let mut harvester = create_harvester(&server, vec![Tier::Challenger], &clock);
    harvester.step().await.unwrap();

    let step = harvester.step().await.unwrap();
    assert_eq!(
        step,
        Step::PlayerPolled {
            puuid: "p-0".to_string(),
            match_ids: 0,
            new_matches: 0
        }
    );
    let player = harvester.registry().get("p-0").unwrap();
    assert!(!player.is_never_harvested());
    assert_eq!(player.last_harvest.unwrap().match_count, 0);
}

#[tokio::test]
async fn test_roster_refresh_is_due_again_after_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/CHALLENGER/I", LEAGUE_PREFIX)))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(league_page("p", 1, "CHALLENGER", "I")),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/CHALLENGER/I", LEAGUE_PREFIX)))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(vec![])))
        .expect(2)
        .mount(&server)
        .await;
    mount_match_ids(&server, "p-0", &[]).await;

    let clock = ManualClock::new(t0());
    let mut harvester = create_harvester(&server, vec![Tier::Challenger], &clock);

    assert!(matches!(harvester.step().await.unwrap(), Step::RosterRefreshed { .. }));
    clock.advance(Duration::hours(23));
    assert!(matches!(harvester.step().await.unwrap(), Step::PlayerPolled { .. }));
    clock.advance(Duration::hours(1));
    assert!(matches!(harvester.step().await.unwrap(), Step::RosterRefreshed { .. }));
    assert_eq!(harvester.last_roster_refresh(), Some(t0() + Duration::hours(24)));
}

#[tokio::test]
async fn test_players_leaving_the_ladder_are_pruned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/CHALLENGER/I", LEAGUE_PREFIX)))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(league_page("old", 1, "CHALLENGER", "I")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/CHALLENGER/I", LEAGUE_PREFIX)))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(league_page("new", 1, "CHALLENGER", "I")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/CHALLENGER/I", LEAGUE_PREFIX)))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(vec![])))
        .mount(&server)
        .await;

    let clock = ManualClock::new(t0());
    let mut harvester = create_harvester(&server, vec![Tier::Challenger], &clock);
    harvester.step().await.unwrap();
    assert!(harvester.registry().get("old-0").is_some());

    // Still inside the window: both players are kept.
    clock.advance(Duration::days(6));
    harvester.step().await.unwrap();
    assert_eq!(harvester.registry().len(), 2);

    // Past the window since "old-0" was last listed.
    clock.advance(Duration::days(2));
    harvester.step().await.unwrap();
    assert!(harvester.registry().get("old-0").is_none());
    assert!(harvester.registry().get("new-0").is_some());
}

#[tokio::test]
async fn test_fatal_client_error_stops_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;

    let clock = ManualClock::new(t0());
    let mut harvester = create_harvester(&server, vec![Tier::Challenger], &clock);

    let result = harvester.run().await;
    assert!(matches!(
        result,
        Err(HarvestError::Api(ApiError::RetriesExhausted { attempts: 6, .. }))
    ));
    assert!(harvester.registry().is_empty());
    assert!(harvester.last_roster_refresh().is_none());
}
