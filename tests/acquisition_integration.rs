//! End-to-end acquisition tests over live HTTP, with the provider played by
//! wiremock. Covers the structured API, the legacy session flow, the script
//! scrape, catalog resolution, and the fallback chain wiring them together.

use demanda_rt::catalog::CatalogResolver;
use demanda_rt::chain::FallbackChain;
use demanda_rt::config::EngineConfig;
use demanda_rt::errors::CatalogError;
use demanda_rt::events::{EngineEvent, EventBus};
use demanda_rt::model::{FetchStatus, FetchWindow, MetricDescriptor, SeriesKind, SourceId};
use demanda_rt::series::{deviation, latest, normalize};
use demanda_rt::sources::{
    legacy_session::LegacySessionAdapter, script_scrape::ScriptScrapeAdapter,
    structured_api::StructuredApiAdapter, SourceAdapter,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> EngineConfig {
    let base = server.uri();
    let mut cfg = EngineConfig::default();
    cfg.api_base_url = base.clone();
    cfg.legacy_landing_url = format!("{base}/portal/demanda");
    cfg.legacy_service_url = format!("{base}/SerconService.svc/GetDemandaRT");
    cfg.page_url = format!("{base}/consumo/demanda-en-tiempo-real");
    cfg.api_timeout_ms = 2_000;
    cfg.legacy_timeout_ms = 2_000;
    cfg.scrape_timeout_ms = 2_000;
    cfg
}

fn demanda_real() -> MetricDescriptor {
    MetricDescriptor {
        id: "DemaReal".into(),
        display_name: "Demanda Real".into(),
    }
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/lists"))
        .and(body_string_contains("ListadoMetricas"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Items":[
                {"MetricId":"DemaReal","MetricName":"Demanda Real"},
                {"MetricId":"DemaProg","MetricName":"Demanda Programada"},
                {"MetricId":"GeneReal","MetricName":"Generación Real"}
            ]}"#,
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn structured_api_decodes_the_spec_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hourly"))
        .and(body_string_contains("DemaReal"))
        .and(body_string_contains("Sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Items":[{"Date":"2024-01-01","Hour01":950.0,"Hour02":960.0}]}"#,
        ))
        .mount(&server)
        .await;

    let adapter = StructuredApiAdapter::new(&config_for(&server));
    let outcome = adapter.fetch(&demanda_real(), &FetchWindow::today()).await;

    assert_eq!(outcome.status, FetchStatus::Success);
    let points = normalize(outcome.points);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].timestamp.to_rfc3339(), "2024-01-01T00:00:00-05:00");
    assert_eq!(points[0].value, 950.0);
    assert_eq!(points[0].kind, SeriesKind::Real);
    assert_eq!(points[1].timestamp.to_rfc3339(), "2024-01-01T01:00:00-05:00");
    assert_eq!(points[1].value, 960.0);
}

#[tokio::test]
async fn structured_api_classifies_empty_and_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Items":[]}"#))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hourly"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let adapter = StructuredApiAdapter::new(&config_for(&server));
    let first = adapter.fetch(&demanda_real(), &FetchWindow::today()).await;
    assert_eq!(first.status, FetchStatus::EmptyResult);

    let second = adapter.fetch(&demanda_real(), &FetchWindow::today()).await;
    assert_eq!(second.status, FetchStatus::RemoteRejected);
}

#[tokio::test]
async fn legacy_session_bootstraps_a_cookie_before_the_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/portal/demanda"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "ASP.NET_SessionId=abc123; Path=/")
                .set_body_string("<html>portal</html>"),
        )
        .mount(&server)
        .await;
    // The service only answers when the session cookie came back.
    Mock::given(method("POST"))
        .and(path("/SerconService.svc/GetDemandaRT"))
        .and(header("cookie", "ASP.NET_SessionId=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"GetDemandaRTResult":{
                "DemandaReal":[{"Fecha":"/Date(1704117600000)/","Valor":9500.0}],
                "DemandaProgramada":[{"Fecha":"/Date(1704117600000)/","Valor":9400.0}]
            }}"#,
        ))
        .mount(&server)
        .await;

    let adapter = LegacySessionAdapter::new(&config_for(&server));
    let outcome = adapter.fetch(&demanda_real(), &FetchWindow::today()).await;

    assert_eq!(outcome.status, FetchStatus::Success, "{:?}", outcome.message);
    let points = normalize(outcome.points);
    assert_eq!(points.len(), 2);
    assert_eq!(latest(&points, SeriesKind::Real).unwrap().value, 9500.0);
    assert_eq!(latest(&points, SeriesKind::Scheduled).unwrap().value, 9400.0);
    assert!((deviation(&points) - (9500.0 - 9400.0) / 9400.0).abs() < 1e-12);
}

#[tokio::test]
async fn legacy_html_body_is_an_access_block_not_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/portal/demanda"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/SerconService.svc/GetDemandaRT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<!DOCTYPE html><html><body>Request blocked</body></html>",
        ))
        .mount(&server)
        .await;

    let adapter = LegacySessionAdapter::new(&config_for(&server));
    let outcome = adapter.fetch(&demanda_real(), &FetchWindow::today()).await;
    assert_eq!(outcome.status, FetchStatus::RemoteRejected);
}

#[tokio::test]
async fn scrape_extracts_the_embedded_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/consumo/demanda-en-tiempo-real"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><script>
                var opciones = {animar: true};
                var demandaReal = [
                    {"Fecha":"/Date(1704117600000)/","Valor":9500.0},
                    {"Fecha":"/Date(1704121200000)/","Valor":9612.5}
                ];
            </script></head><body><div id="grafica-demanda"></div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let adapter = ScriptScrapeAdapter::new(&config_for(&server));
    let outcome = adapter.fetch(&demanda_real(), &FetchWindow::today()).await;

    assert_eq!(outcome.status, FetchStatus::Success, "{:?}", outcome.message);
    assert_eq!(outcome.points.len(), 2);
    assert_eq!(outcome.points[1].value, 9612.5);
}

#[tokio::test]
async fn scrape_missing_marker_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/consumo/demanda-en-tiempo-real"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><script>var algoMas = 1;</script></head><body>redesigned</body></html>",
        ))
        .mount(&server)
        .await;

    let adapter = ScriptScrapeAdapter::new(&config_for(&server));
    let outcome = adapter.fetch(&demanda_real(), &FetchWindow::today()).await;
    assert_eq!(outcome.status, FetchStatus::DecodeError);
}

#[tokio::test]
async fn catalog_resolves_synonyms_and_serves_stale_after_outage() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let resolver = CatalogResolver::new(&config_for(&server));
    // Substring fallback: "Demanda" matches two entries; lexicographically
    // first id wins and the loser is recorded.
    let res = resolver.resolve("Demanda").await.unwrap();
    assert_eq!(res.metric.id, "DemaProg");
    assert_eq!(res.alternatives, vec!["DemaReal".to_string()]);

    // Provider goes away; the cached catalog still resolves known ids...
    drop(server);
    let res = resolver.resolve("DemaReal").await.unwrap();
    assert_eq!(res.metric.display_name, "Demanda Real");

    // ...and an unknown id fails with NotFound, not a transport fault.
    let err = resolver.resolve("NoExiste").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn chain_falls_back_from_broken_api_to_legacy_service() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    // Structured API is down for maintenance.
    Mock::given(method("POST"))
        .and(path("/hourly"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // Legacy flow works.
    Mock::given(method("GET"))
        .and(path("/portal/demanda"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "ASP.NET_SessionId=zzz; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/SerconService.svc/GetDemandaRT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"GetDemandaRTResult":{
                "DemandaReal":[{"Fecha":"/Date(1704117600000)/","Valor":10250.0}],
                "DemandaProgramada":[]
            }}"#,
        ))
        .mount(&server)
        .await;

    let mut cfg = config_for(&server);
    cfg.source_order = vec![SourceId::StructuredApi, SourceId::LegacySession];

    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let chain = FallbackChain::new(&cfg, bus);
    let result = chain.acquire("DemaReal").await;

    assert!(result.is_success());
    assert_eq!(result.outcome.source_id, SourceId::LegacySession);
    assert_eq!(result.attempts.len(), 2);
    assert_eq!(result.attempts[0].source_id, SourceId::StructuredApi);
    assert_eq!(result.attempts[0].status, FetchStatus::RemoteRejected);
    assert_eq!(result.attempts[1].status, FetchStatus::Success);

    // The bus saw the whole cycle: start, two attempts, completion.
    assert!(matches!(events.recv().await.unwrap(), EngineEvent::CycleStarted { .. }));
    assert!(matches!(
        events.recv().await.unwrap(),
        EngineEvent::SourceAttempted { source_id: SourceId::StructuredApi, .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        EngineEvent::SourceAttempted { source_id: SourceId::LegacySession, .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        EngineEvent::CycleComplete { source_id: SourceId::LegacySession, point_count: 1, .. }
    ));
}

#[tokio::test]
async fn chain_renders_an_unknown_metric_as_a_failed_cycle() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    // No adapter may run when resolution fails.
    Mock::given(method("POST"))
        .and(path("/hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Items":[]}"#))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config_for(&server);
    cfg.source_order = vec![SourceId::StructuredApi];

    let chain = FallbackChain::new(&cfg, EventBus::default());
    let result = chain.acquire("NoExiste").await;

    assert!(!result.is_success());
    assert_eq!(result.outcome.source_id, SourceId::Engine);
    assert!(result.outcome.points.is_empty());
    assert!(result
        .outcome
        .message
        .as_deref()
        .unwrap_or("")
        .contains("NoExiste"));
    assert_eq!(result.attempts.len(), 1);
    assert_eq!(result.attempts[0].source_id, SourceId::Engine);
}

#[tokio::test]
async fn chain_reports_the_last_failure_when_everything_is_down() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    Mock::given(method("POST"))
        .and(path("/hourly"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/portal/demanda"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/SerconService.svc/GetDemandaRT"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;
    // Page was redesigned: marker gone.
    Mock::given(method("GET"))
        .and(path("/consumo/demanda-en-tiempo-real"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>new SPA</body></html>"))
        .mount(&server)
        .await;

    let mut cfg = config_for(&server);
    cfg.source_order = vec![
        SourceId::StructuredApi,
        SourceId::LegacySession,
        SourceId::ScriptScrape,
    ];

    let chain = FallbackChain::new(&cfg, EventBus::default());
    let result = chain.acquire("DemaReal").await;

    assert!(!result.is_success());
    // One entry per adapter, in priority order.
    let statuses: Vec<(SourceId, FetchStatus)> = result
        .attempts
        .iter()
        .map(|a| (a.source_id, a.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (SourceId::StructuredApi, FetchStatus::RemoteRejected),
            (SourceId::LegacySession, FetchStatus::RemoteRejected),
            (SourceId::ScriptScrape, FetchStatus::DecodeError),
        ]
    );
    // The outcome is the LAST attempt's: the most specific reason.
    assert_eq!(result.outcome.source_id, SourceId::ScriptScrape);
    assert_eq!(result.outcome.status, FetchStatus::DecodeError);
    assert!(result.outcome.points.is_empty());
}
