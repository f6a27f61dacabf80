//! Sessions and results pages.
//!
//! A unit of work in a batch is one isolated session showing one results
//! page. The page fills its table in the background after it is loaded;
//! the harness watches its row count and scrapes it once populated.
//!
//! [`TrialPage`] is the built-in page: it runs a plan of trials through a
//! [`TrialRunner`] and renders one row per result record. Other session
//! kinds (a headless browser, say) plug in by implementing
//! [`SessionFactory`] and [`ResultsPage`].

use async_trait::async_trait;
use rbperf_adapters::{TrialOrchestrator, TrialRunner};
use rbperf_core::config::ProbeSettings;
use rbperf_core::execution::UnitId;
use rbperf_core::TrialRequest;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

/// Errors raised by a session before its page could be watched.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session could not be created.
    #[error("Failed to launch session for unit {unit}: {reason}")]
    Launch {
        /// Unit the session was for.
        unit: UnitId,
        /// Why the launch failed.
        reason: String,
    },

    /// The page could not be loaded.
    #[error("Failed to load results page: {0}")]
    Load(String),
}

/// A results page inside one session.
#[async_trait]
pub trait ResultsPage: Send + Sync {
    /// Navigate to the page; rows start rendering after this returns.
    async fn load(&mut self) -> Result<(), SessionError>;

    /// Number of rows rendered so far.
    async fn rendered_rows(&self) -> usize;

    /// Cells of every row rendered so far, in table order.
    async fn scrape(&self) -> Vec<Vec<String>>;

    /// Tear the session down. Called exactly once, whatever the outcome.
    async fn close(&mut self);
}

/// Creates one isolated session per unit.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Launch the session for `unit`.
    async fn launch(&self, unit: UnitId) -> Result<Box<dyn ResultsPage>, SessionError>;

    /// Rows a fully populated page shows.
    fn expected_rows(&self) -> usize;
}

/// A page that renders the result of each trial in `plan`, in order.
pub struct TrialPage {
    runner: Arc<dyn TrialRunner>,
    plan: Arc<[TrialRequest]>,
    rows: Arc<Mutex<Vec<Vec<String>>>>,
    task: Option<JoinHandle<()>>,
}

impl TrialPage {
    /// Create an unloaded page.
    pub fn new(runner: Arc<dyn TrialRunner>, plan: Arc<[TrialRequest]>) -> Self {
        Self {
            runner,
            plan,
            rows: Arc::new(Mutex::new(Vec::new())),
            task: None,
        }
    }
}

#[async_trait]
impl ResultsPage for TrialPage {
    async fn load(&mut self) -> Result<(), SessionError> {
        if self.task.is_some() {
            return Err(SessionError::Load("page already loaded".to_string()));
        }

        let runner = self.runner.clone();
        let plan = self.plan.clone();
        let rows = self.rows.clone();
        self.task = Some(tokio::spawn(async move {
            for request in plan.iter() {
                let record = runner.run(request).await;
                if let Ok(mut rows) = rows.lock() {
                    rows.push(record.table_cells());
                }
            }
            debug!(trials = plan.len(), "Results page populated");
        }));
        Ok(())
    }

    async fn rendered_rows(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    async fn scrape(&self) -> Vec<Vec<String>> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    async fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancelled or finished, either way the task is gone.
            let _ = task.await;
        }
    }
}

impl Drop for TrialPage {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Launches [`TrialPage`]s, each with its own orchestrator and HTTP client.
#[derive(Debug, Clone)]
pub struct TrialPageFactory {
    settings: ProbeSettings,
    plan: Arc<[TrialRequest]>,
}

impl TrialPageFactory {
    /// Pages run `plan`.
    pub fn new(settings: ProbeSettings, plan: Vec<TrialRequest>) -> Self {
        Self {
            settings,
            plan: plan.into(),
        }
    }

    /// Pages run every object in every region.
    pub fn full_plan(settings: ProbeSettings) -> Self {
        Self::new(settings, TrialRequest::full_plan())
    }
}

#[async_trait]
impl SessionFactory for TrialPageFactory {
    async fn launch(&self, unit: UnitId) -> Result<Box<dyn ResultsPage>, SessionError> {
        let orchestrator =
            TrialOrchestrator::new(&self.settings).map_err(|e| SessionError::Launch {
                unit,
                reason: e.to_string(),
            })?;
        Ok(Box::new(TrialPage::new(Arc::new(orchestrator), self.plan.clone())))
    }

    fn expected_rows(&self) -> usize {
        self.plan.len()
    }
}
