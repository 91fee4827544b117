//! Registry of mounted flow sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ActiveFlow, FlowKind, FlowServices, FlowSession, FlowView, SubmitStart};
use crate::error::FlowError;
use crate::forms::{FieldPatch, RegistrationType};
use crate::navigation::{DashboardTarget, dashboard_link};
use crate::handoff::Slot;
use crate::wizard::Transition;

/// Owns every live session. Each session sits behind its own lock, so one
/// request at a time drives a given flow while others proceed.
pub struct FlowManager {
    services: FlowServices,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<FlowSession>>>>,
}

impl FlowManager {
    pub fn new(services: FlowServices) -> Self {
        Self {
            services,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn services(&self) -> &FlowServices {
        &self.services
    }

    /// Mount a new flow for `visitor`.
    pub async fn mount(&self, visitor: &str, kind: FlowKind) -> Result<FlowView, FlowError> {
        let flow = ActiveFlow::mount(kind, visitor, &self.services.store).await?;
        let session = FlowSession::new(visitor, flow);
        let view = session.view();

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, Arc::new(Mutex::new(session)));
        info!(flow_id = %view.id, visitor, flow = %kind, "Flow mounted");
        Ok(view)
    }

    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<FlowSession>>, FlowError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .cloned()
            .ok_or(FlowError::NotFound { id })
    }

    pub async fn view(&self, id: Uuid) -> Result<FlowView, FlowError> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.touch();
        Ok(session.view())
    }

    /// Unmount a flow. Its state is discarded.
    pub async fn close(&self, id: Uuid) -> Result<(), FlowError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id).ok_or(FlowError::NotFound { id })?;
        debug!(flow_id = %id, "Flow closed");
        Ok(())
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn patch(&self, id: Uuid, patch: &FieldPatch) -> Result<FlowView, FlowError> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.touch();
        let touched = session.flow.as_flow_mut().edit(patch)?;
        debug!(flow_id = %id, fields = ?touched, "Fields updated");
        Ok(session.view())
    }

    /// Advance the flow. On a climate-finance last step the submission
    /// effect runs with the session unlocked, so reads observe
    /// `submitting` and edits are refused until it settles.
    pub async fn advance(&self, id: Uuid) -> Result<(Transition, FlowView), FlowError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        session.touch();
        let visitor = session.visitor_id.clone();

        let pending = match session.flow.begin_submission()? {
            None => {
                let transition = session
                    .flow
                    .as_flow_mut()
                    .advance(&visitor, &self.services)
                    .await?;
                debug!(flow_id = %id, ?transition, "Advance");
                return Ok((transition, session.view()));
            }
            Some(SubmitStart::Settled(transition)) => return Ok((transition, session.view())),
            Some(SubmitStart::Pending(pending)) => pending,
        };
        drop(session);

        let outcome = self
            .services
            .submitter
            .submit(pending.endpoint, &pending.payload)
            .await;

        let mut session = handle.lock().await;
        session.touch();
        let transition = session
            .flow
            .finish_submission(&visitor, &self.services.store, pending, outcome)
            .await;
        debug!(flow_id = %id, ?transition, "Submission settled");
        Ok((transition, session.view()))
    }

    pub async fn retreat(&self, id: Uuid) -> Result<(Transition, FlowView), FlowError> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.touch();
        let transition = session.flow.as_flow_mut().retreat()?;
        Ok((transition, session.view()))
    }

    pub async fn restart(&self, id: Uuid) -> Result<(Transition, FlowView), FlowError> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.touch();
        let transition = session.flow.as_flow_mut().restart()?;
        Ok((transition, session.view()))
    }

    pub async fn choose_registration_type(
        &self,
        id: Uuid,
        kind: RegistrationType,
    ) -> Result<(Transition, FlowView), FlowError> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.touch();
        let transition = session.flow.choose_registration_type(kind)?;
        Ok((transition, session.view()))
    }

    /// Unmount sessions idle for longer than `max_idle`. A session whose
    /// lock is held is in use and kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => now.saturating_duration_since(session.last_active) <= max_idle,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle flows");
        }
        evicted
    }

    /// Evict idle sessions and expired session-scoped handoff slots.
    /// Returns `(sessions, slots)` evicted.
    pub async fn sweep(&self, max_idle: Duration) -> (usize, usize) {
        let sessions = self.evict_idle(max_idle).await;
        let slots = match self.services.store.evict_session(max_idle).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to expire session slots");
                0
            }
        };
        (sessions, slots)
    }

    /// The navigation bar's "Dashboard" href for `visitor` on `path`.
    pub async fn dashboard_link(&self, visitor: &str, path: &str) -> String {
        let config = self
            .services
            .store
            .read::<DashboardTarget>(visitor, Slot::DashboardConfig)
            .await;
        dashboard_link(path, config.as_ref())
    }
}

/// Run [`FlowManager::sweep`] every `every` until the task is aborted.
pub fn spawn_sweeper(
    flows: Arc<FlowManager>,
    max_idle: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // Skip immediate first tick
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (sessions, slots) = flows.sweep(max_idle).await;
            debug!(sessions, slots, "Sweep finished");
        }
    })
}
