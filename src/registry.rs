//! Client-side plan lifecycle: the known runs, which run is published, and
//! which run's detail is on display.
//!
//! The registry never flips state speculatively. Publish and delete only
//! change local state after the backend confirms, and publish re-reads the
//! run list rather than editing flags in place.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, RegistryError};
use crate::model::{OverviewMetric, RawRunDetail, RouteDetail, Run, RunId};
use crate::normalize::{MapResolver, MapSelector, NormalizedDetail, normalize, route_map_url};
use crate::services::plan_api::PlanApi;

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// The detail pane. Empty when no run is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailView {
    pub run_id: Option<RunId>,
    pub name: Option<String>,
    pub overview: Vec<OverviewMetric>,
    pub routes: Vec<RouteDetail>,
    pub map_url: Option<String>,
    /// Always false: the detail pane inspects runs as drafts. The run list
    /// carries the real flag.
    pub is_published: bool,
}

impl DetailView {
    pub fn is_empty(&self) -> bool {
        self.run_id.is_none()
    }

    fn clear(&mut self) {
        *self = DetailView::default();
    }

    fn normalized(&self) -> NormalizedDetail {
        NormalizedDetail {
            overview: self.overview.clone(),
            routes: self.routes.clone(),
            map_url: self.map_url.clone(),
        }
    }
}

/// Identifies one detail fetch. Only the most recently issued ticket may
/// update the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    pub run_id: RunId,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailRequest {
    /// The run was already on display; the view has been closed.
    Closed,
    /// Fetch the run's detail and hand the result to
    /// [`PlanRegistry::apply_detail`].
    Fetch(DetailTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// The dashboard's view of the active plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PublishedPlan {
    Active {
        run_id: Option<RunId>,
        name: Option<String>,
        detail: NormalizedDetail,
    },
    /// The backend answered 404: nothing is published.
    NoneActive,
    /// The backend could not be read; carries a user-facing notice.
    Unavailable(String),
}

pub struct PlanRegistry {
    runs: Vec<Run>,
    detail: DetailView,
    resolver: MapResolver,
    generation: u64,
    /// Run of the ticket issued last, until that ticket is applied.
    pending: Option<RunId>,
}

impl PlanRegistry {
    pub fn new(resolver: MapResolver) -> Self {
        Self {
            runs: Vec::new(),
            detail: DetailView::default(),
            resolver,
            generation: 0,
            pending: None,
        }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn run(&self, run_id: RunId) -> Option<&Run> {
        self.runs.iter().find(|r| r.run_id == run_id)
    }

    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    pub fn resolver(&self) -> &MapResolver {
        &self.resolver
    }

    /// Replaces the known runs, newest first.
    pub fn set_runs(&mut self, mut runs: Vec<Run>) {
        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.runs = runs;
    }

    /// Fetches every run. On failure the list degrades to empty and the error
    /// is returned as a notice.
    #[tracing::instrument(skip_all)]
    pub async fn load_all<A: PlanApi + ?Sized>(&mut self, api: &A) -> Result<&[Run], RegistryError> {
        match api.list_runs().await {
            Ok(runs) => {
                info!(count = runs.len(), "Run list loaded");
                self.set_runs(runs);
                Ok(&self.runs)
            }
            Err(e) => {
                warn!(error = %e, "Could not load runs");
                self.runs.clear();
                Err(e.into())
            }
        }
    }

    /// The single published run, if any.
    pub fn published(&self) -> Result<Option<&Run>, RegistryError> {
        let published: Vec<&Run> = self.runs.iter().filter(|r| r.is_published).collect();
        match published.as_slice() {
            [] => Ok(None),
            [run] => Ok(Some(*run)),
            many => Err(RegistryError::AmbiguousPublished(
                many.iter().map(|r| r.run_id).collect(),
            )),
        }
    }

    /// Publishes `run_id`, then re-reads the run list and keeps the current
    /// display order. Runs the backend knows but this list does not yet show
    /// are appended.
    #[tracing::instrument(skip(self, api), fields(run_id = %run_id))]
    pub async fn publish<A: PlanApi + ?Sized>(
        &mut self,
        run_id: RunId,
        api: &A,
    ) -> Result<(), RegistryError> {
        api.publish_run(run_id).await?;
        let fresh = api.list_runs().await?;

        let order: Vec<RunId> = self.runs.iter().map(|r| r.run_id).collect();
        self.runs = keep_display_order(&order, fresh);

        match self.published() {
            Ok(Some(run)) if run.run_id == run_id => info!("Run published"),
            Ok(other) => warn!(
                published = ?other.map(|r| r.run_id),
                "Backend accepted publish but reports a different published run"
            ),
            Err(e) => warn!(error = %e, "Publish left more than one run published"),
        }
        Ok(())
    }

    /// Deletes `run_id` after `confirm` approves. Clears the detail view if it
    /// was showing the deleted run, and voids any detail fetch still
    /// outstanding for it.
    #[tracing::instrument(skip(self, api, confirm), fields(run_id = %run_id))]
    pub async fn delete<A, C>(
        &mut self,
        run_id: RunId,
        api: &A,
        confirm: &C,
    ) -> Result<DeleteOutcome, RegistryError>
    where
        A: PlanApi + ?Sized,
        C: Confirm + ?Sized,
    {
        let label = self
            .run(run_id)
            .map(|r| r.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("run {run_id}"));

        if !confirm.confirm(&format!("Delete {label}? This cannot be undone.")) {
            info!("Delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        api.delete_run(run_id).await?;

        self.runs.retain(|r| r.run_id != run_id);
        if self.detail.run_id == Some(run_id) {
            self.detail.clear();
        }
        if self.pending == Some(run_id) {
            self.pending = None;
            self.generation += 1;
        }
        info!("Run deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Starts showing `run_id`. Asking for the run already on display closes
    /// the view instead. Any earlier outstanding ticket becomes stale.
    pub fn request_detail(&mut self, run_id: RunId) -> DetailRequest {
        self.generation += 1;
        if self.detail.run_id == Some(run_id) {
            debug!(%run_id, "Detail toggled off");
            self.detail.clear();
            self.pending = None;
            return DetailRequest::Closed;
        }
        self.pending = Some(run_id);
        DetailRequest::Fetch(DetailTicket {
            run_id,
            generation: self.generation,
        })
    }

    /// Applies a fetched detail. Returns `Ok(false)` when `ticket` has been
    /// superseded and the result was dropped.
    pub fn apply_detail(
        &mut self,
        ticket: DetailTicket,
        result: Result<RawRunDetail, ApiError>,
    ) -> Result<bool, RegistryError> {
        if ticket.generation != self.generation {
            debug!(run_id = %ticket.run_id, "Dropping stale detail response");
            return Ok(false);
        }
        self.pending = None;

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!(run_id = %ticket.run_id, error = %e, "Could not load run detail");
                self.detail.clear();
                return Err(e.into());
            }
        };

        let normalized = normalize(&raw, &self.resolver);
        let name = raw
            .name
            .or_else(|| self.run(ticket.run_id).map(|r| r.name.clone()));

        self.detail = DetailView {
            run_id: Some(ticket.run_id),
            name,
            overview: normalized.overview,
            routes: normalized.routes,
            map_url: normalized.map_url,
            is_published: false,
        };
        Ok(true)
    }

    /// [`Self::request_detail`] and [`Self::apply_detail`] in one step.
    #[tracing::instrument(skip(self, api), fields(run_id = %run_id))]
    pub async fn select_detail<A: PlanApi + ?Sized>(
        &mut self,
        run_id: RunId,
        api: &A,
    ) -> Result<DetailRequest, RegistryError> {
        let request = self.request_detail(run_id);
        if let DetailRequest::Fetch(ticket) = request {
            let result = api.run_detail(run_id).await;
            self.apply_detail(ticket, result)?;
        }
        Ok(request)
    }

    /// Map for the detail pane; `None` renders the "no map" placeholder.
    pub fn detail_map_url(&self, selector: MapSelector) -> Option<String> {
        route_map_url(&self.detail.normalized(), selector, &self.resolver)
    }

    /// Loads the active plan for the dashboard.
    #[tracing::instrument(skip_all)]
    pub async fn load_published<A: PlanApi + ?Sized>(&self, api: &A) -> PublishedPlan {
        match api.published_run().await {
            Ok(raw) => PublishedPlan::Active {
                run_id: raw.run_id,
                name: raw.name.clone(),
                detail: normalize(&raw, &self.resolver),
            },
            Err(ApiError::NotFound) => {
                info!("No plan is currently published");
                PublishedPlan::NoneActive
            }
            Err(e) => {
                warn!(error = %e, "Could not load the published plan");
                PublishedPlan::Unavailable(format!("The active plan could not be loaded: {e}"))
            }
        }
    }
}

/// Orders `fresh` by each run's position in `previous`; runs not seen before
/// go last in the order the backend sent them.
fn keep_display_order(previous: &[RunId], mut fresh: Vec<Run>) -> Vec<Run> {
    let position: HashMap<RunId, usize> = previous
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();
    fresh.sort_by_key(|r| position.get(&r.run_id).copied().unwrap_or(usize::MAX));
    fresh
}
