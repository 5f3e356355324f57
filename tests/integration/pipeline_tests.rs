//! End-to-end pipeline runs against a mock HTTP server

use super::fast_config;
use scrape_guardrails::config::Config;
use scrape_guardrails::output::{load_triage, read_health_report};
use scrape_guardrails::pipeline::{list_snapshots, DeadLetter};
use scrape_guardrails::Orchestrator;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn game_page(title: &str, headline_class: &str) -> String {
    format!(
        r#"<html><head><title>{title} | NBA</title></head>
<body><header><h1 class="{headline_class}">{title}</h1></header><div class="score">101-99</div></body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn run_nba(config: &Config, urls: Vec<String>) -> scrape_guardrails::RunSummary {
    let pipeline = config.pipeline("nba").unwrap();
    Orchestrator::new(config, pipeline)
        .unwrap()
        .run(urls)
        .await
        .unwrap()
}

fn read_lines(path: &str) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_failing_url_goes_to_dead_letter() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/game/1", game_page("Lakers vs Celtics", "headline")).await;
    Mock::given(method("GET"))
        .and(path("/game/2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/game/3", game_page("Bulls vs Knicks", "headline")).await;

    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let urls: Vec<String> = (1..=3).map(|i| format!("{}/game/{}", base_url, i)).collect();

    let summary = run_nba(&config, urls.clone()).await;
    assert_eq!(summary.ok, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total, 3);

    let records = read_lines(&config.output.data_path);
    assert_eq!(records.len(), 2);
    let mut titles: Vec<&str> = records.iter().map(|r| r["title"].as_str().unwrap()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Bulls vs Knicks", "Lakers vs Celtics"]);
    for record in &records {
        assert_eq!(record["selector_idx"], 0);
        assert_eq!(record["selector_strategy"], "css");
        assert_eq!(record["struct_changed"], false);
    }

    let dead: Vec<DeadLetter> = std::fs::read_to_string(&config.output.dead_letter_path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].url, urls[1]);
    assert!(dead[0].error.contains("Retries exhausted"));
    assert!(dead[0].error.contains("http 503"));

    let health = read_health_report(Path::new(&config.output.health_path)).unwrap();
    assert_eq!((health.ok, health.failed, health.total), (2, 1, 3));
    assert_eq!(health.pipeline, "nba");
    assert_eq!(health.run_id, summary.run_id);

    let triage = load_triage(Path::new(&config.output.dead_letter_path))
        .unwrap()
        .unwrap();
    assert_eq!(triage.len(), 1);
    assert_eq!(triage[0].count, 1);
}

#[tokio::test]
async fn test_every_url_gets_exactly_one_record() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for i in 0..12 {
        let route = format!("/item/{}", i);
        if i % 3 == 0 {
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .respond_with(ResponseTemplate::new(404))
                .mount(&mock_server)
                .await;
        } else {
            mount_page(&mock_server, &route, game_page(&format!("Item {}", i), "headline")).await;
        }
    }

    let dir = TempDir::new().unwrap();
    let mut config = fast_config(dir.path());
    config.fetch.max_concurrency = 4;
    let urls: Vec<String> = (0..12).map(|i| format!("{}/item/{}", base_url, i)).collect();

    let summary = run_nba(&config, urls.clone()).await;
    assert_eq!(summary.ok, 8);
    assert_eq!(summary.failed, 4);
    assert_eq!(summary.ok + summary.failed, summary.total);

    let successes = read_lines(&config.output.data_path);
    let failures = read_lines(&config.output.dead_letter_path);

    let health = read_health_report(Path::new(&config.output.health_path)).unwrap();
    assert_eq!(health.ok, successes.len());
    assert_eq!(health.failed, failures.len());

    let seen: Vec<String> = successes
        .iter()
        .chain(failures.iter())
        .map(|r| r["url"].as_str().unwrap().to_string())
        .collect();
    let unique: HashSet<&String> = seen.iter().collect();
    assert_eq!(seen.len(), urls.len());
    assert_eq!(unique.len(), urls.len());
}

#[tokio::test]
async fn test_structural_change_between_runs() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/game/1", game_page("Lakers vs Celtics", "headline")).await;

    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let urls = vec![format!("{}/game/1", base_url)];

    let first = run_nba(&config, urls.clone()).await;
    assert_eq!(first.struct_changes, 0);

    // same template, different text
    mock_server.reset().await;
    mount_page(&mock_server, "/game/1", game_page("Heat vs Magic", "headline")).await;

    let second = run_nba(&config, urls.clone()).await;
    assert_eq!(second.struct_changes, 0);
    let records = read_lines(&config.output.data_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["struct_changed"], false);
    assert_eq!(records[0]["title"], "Heat vs Magic");

    // the headline loses its class, so the first selector no longer matches
    mock_server.reset().await;
    mount_page(&mock_server, "/game/1", game_page("Heat vs Magic", "banner")).await;

    let third = run_nba(&config, urls).await;
    assert_eq!(third.struct_changes, 1);
    let records = read_lines(&config.output.data_path);
    assert_eq!(records[0]["struct_changed"], true);
    assert_eq!(records[0]["selector_idx"], 1);

    let health = read_health_report(Path::new(&config.output.health_path)).unwrap();
    assert_eq!(health.struct_changes, 1);

    let snapshots = list_snapshots(Path::new(&config.output.cache_dir))
        .unwrap()
        .unwrap();
    assert_eq!(snapshots.len(), 1);
}

#[tokio::test]
async fn test_configured_pipeline_field_name() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/story",
        r#"<html><head><meta property="og:title" content="Trade Deadline"></head><body></body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("guardrails.toml");
    std::fs::write(
        &config_path,
        r#"
[[pipeline]]
name = "stories"
field = "headline"
candidates = [
    { strategy = "css", expr = "h1" },
    { strategy = "attr", expr = "meta[property='og:title']::content" },
]
"#,
    )
    .unwrap();

    let mut config = scrape_guardrails::config::load_config(&config_path).unwrap();
    let fast = fast_config(dir.path());
    config.fetch = fast.fetch;
    config.backoff = fast.backoff;
    config.breaker = fast.breaker;
    config.output = fast.output;

    let pipeline = config.pipeline("stories").unwrap();
    let summary = Orchestrator::new(&config, pipeline)
        .unwrap()
        .run(vec![format!("{}/story", mock_server.uri())])
        .await
        .unwrap();
    assert_eq!(summary.ok, 1);

    let records = read_lines(&config.output.data_path);
    assert_eq!(records[0]["headline"], "Trade Deadline");
    assert_eq!(records[0]["selector_strategy"], "attr");
    assert_eq!(records[0]["selector_idx"], 1);
    assert!(records[0].get("title").is_none());
}
