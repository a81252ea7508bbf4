mod support;

use std::time::{Duration, Instant};

use quartile_core::config::PipelineConfig;
use quartile_core::extract::ExtractionRule;
use quartile_core::render::RenderEngine;
use quartile_core::types::Identifier;
use support::{FakeEngine, PageScript, QUARTILE_CELLS};

fn fast_rule() -> ExtractionRule {
    let mut config = PipelineConfig::default();
    config.extraction.control_timeout_ms = 100;
    config.extraction.cells_timeout_ms = 100;
    config.extraction.poll_interval_ms = 5;
    ExtractionRule::new(&config.extraction)
}

fn id() -> Identifier {
    Identifier::parse("1234-5678").unwrap()
}

#[tokio::test]
async fn clicks_control_then_scans_revealed_cells() {
    let engine = FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS));
    let stats = engine.stats.clone();
    let session = engine.start("chrome".as_ref()).await.unwrap();

    let result = fast_rule().extract(&session, &id()).await;

    assert_eq!(result.len(), 2);
    assert_eq!(result.get("2020"), Some("Q1"));
    assert_eq!(result.get("2021"), Some("Q2"));
    assert_eq!(stats.clicks(), 1, "control is clicked exactly once");
}

#[tokio::test]
async fn control_that_never_appears_yields_empty_result() {
    let engine = FakeEngine::new(PageScript {
        control_present: false,
        ..PageScript::with_cells(QUARTILE_CELLS)
    });
    let stats = engine.stats.clone();
    let session = engine.start("chrome".as_ref()).await.unwrap();

    let started = Instant::now();
    let result = fast_rule().extract(&session, &id()).await;

    assert!(result.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(stats.clicks(), 0);
}

#[tokio::test]
async fn table_without_cells_yields_empty_result() {
    let engine = FakeEngine::new(PageScript::with_cells(&[]));
    let session = engine.start("chrome".as_ref()).await.unwrap();

    let result = fast_rule().extract(&session, &id()).await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn category_label_is_configurable() {
    let mut config = PipelineConfig::default();
    config.extraction.category_label = "Other Field".into();
    config.extraction.poll_interval_ms = 5;
    let rule = ExtractionRule::new(&config.extraction);

    let engine = FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS));
    let session = engine.start("chrome".as_ref()).await.unwrap();

    let result = rule.extract(&session, &id()).await;
    assert_eq!(result.len(), 1);
    assert_eq!(result.get("2020"), Some("Q3"));
}
