#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quartile_core::config::{DEFAULT_CELL_XPATH, DEFAULT_CONTROL_XPATH, PipelineConfig};
use quartile_core::render::{Locator, RenderEngine, RenderError, RenderSession};
use quartile_core::worker::FetchWorker;
use tempfile::TempDir;

/// What the fake page does when driven.
#[derive(Clone, Debug, Default)]
pub struct PageScript {
    /// Table cells that appear once the control is clicked.
    pub cells: Vec<String>,
    /// Whether the control ever shows up.
    pub control_present: bool,
    pub fail_navigation: bool,
    pub fail_launch: bool,
}

impl PageScript {
    pub fn with_cells(cells: &[&str]) -> Self {
        Self {
            cells: cells.iter().map(|c| c.to_string()).collect(),
            control_present: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct EngineStats {
    pub started: AtomicUsize,
    pub terminated: AtomicUsize,
    pub clicks: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
}

impl EngineStats {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn terminated(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[derive(Clone, Debug)]
pub struct FakeEngine {
    script: PageScript,
    pub stats: Arc<EngineStats>,
}

impl FakeEngine {
    pub fn new(script: PageScript) -> Self {
        Self {
            script,
            stats: Arc::new(EngineStats::default()),
        }
    }
}

#[async_trait]
impl RenderEngine for FakeEngine {
    type Session = FakeSession;

    async fn start(&self, _binary: &Path) -> Result<FakeSession, RenderError> {
        if self.script.fail_launch {
            return Err(RenderError::Launch("browser crashed on start".into()));
        }
        self.stats.started.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            script: self.script.clone(),
            stats: Arc::clone(&self.stats),
            clicked: AtomicBool::new(false),
        })
    }
}

#[derive(Debug)]
pub enum FakeElement {
    Control,
    Cell(String),
}

#[derive(Debug)]
pub struct FakeSession {
    script: PageScript,
    stats: Arc<EngineStats>,
    clicked: AtomicBool,
}

#[async_trait]
impl RenderSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.stats.visited.lock().unwrap().push(url.to_string());
        if self.script.fail_navigation {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, RenderError> {
        match locator.as_str() {
            DEFAULT_CONTROL_XPATH if self.script.control_present => Ok(vec![FakeElement::Control]),
            DEFAULT_CELL_XPATH if self.clicked.load(Ordering::SeqCst) => Ok(self
                .script
                .cells
                .iter()
                .cloned()
                .map(FakeElement::Cell)
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn click(&self, element: &FakeElement) -> Result<(), RenderError> {
        match element {
            FakeElement::Control => {
                self.stats.clicks.fetch_add(1, Ordering::SeqCst);
                self.clicked.store(true, Ordering::SeqCst);
                Ok(())
            }
            FakeElement::Cell(_) => Err(RenderError::Interaction("cell is not clickable".into())),
        }
    }

    async fn read_text(&self, element: &FakeElement) -> Result<String, RenderError> {
        match element {
            FakeElement::Cell(text) => Ok(text.clone()),
            FakeElement::Control => Ok("Journal of Examples".into()),
        }
    }

    async fn terminate(&self) -> Result<(), RenderError> {
        self.stats.terminated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Config with short waits, a fake browser binary and output under `root`.
pub fn test_config(root: &TempDir) -> PipelineConfig {
    let binary = root.path().join("chrome");
    std::fs::write(&binary, b"").unwrap();

    let mut config = PipelineConfig::default();
    config.browser.binary_path = Some(binary);
    config.output.dir = root.path().join("result");
    config.extraction.control_timeout_ms = 150;
    config.extraction.cells_timeout_ms = 150;
    config.extraction.poll_interval_ms = 10;
    config.queue.poll_interval_ms = 10;
    config
}

pub fn worker(engine: FakeEngine, config: &PipelineConfig) -> FetchWorker<FakeEngine> {
    FetchWorker::from_config(engine, config)
}

pub fn output_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
    files.sort();
    files
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub const QUARTILE_CELLS: &[&str] = &[
    "Linguistics and Language",
    "2020",
    "Q1",
    "Other Field",
    "2020",
    "Q3",
    "Linguistics and Language",
    "2021",
    "Q2",
];
