use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::tracking::LocationUpdate;
use crate::error::DispatchError;
use crate::models::job::Job;
use crate::models::suggestion::{Suggestion, SuggestionOutcome};
use crate::models::technician::{TechStatus, Technician};
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionTrigger {
    Command,
    Geofence,
}

impl TransitionTrigger {
    pub fn label(&self) -> &'static str {
        match self {
            TransitionTrigger::Command => "command",
            TransitionTrigger::Geofence => "geofence",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusEvent {
    pub technician_id: Uuid,
    pub job_id: Option<Uuid>,
    pub from: TechStatus,
    pub to: TechStatus,
    pub trigger: TransitionTrigger,
    pub occurred_at: DateTime<Utc>,
}

pub struct EngineState {
    pub config: EngineConfig,
    pub technicians: DashMap<Uuid, Technician>,
    pub jobs: DashMap<Uuid, Job>,
    pub suggestions: DashMap<Uuid, Suggestion>,
    pub location_tx: mpsc::Sender<LocationUpdate>,
    pub status_events_tx: broadcast::Sender<StatusEvent>,
    pub metrics: Metrics,
}

impl EngineState {
    pub fn new(config: EngineConfig) -> (Self, mpsc::Receiver<LocationUpdate>) {
        let (location_tx, location_rx) = mpsc::channel(config.location_queue_size);
        let (status_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                config,
                technicians: DashMap::new(),
                jobs: DashMap::new(),
                suggestions: DashMap::new(),
                location_tx,
                status_events_tx,
                metrics: Metrics::new(),
            },
            location_rx,
        )
    }

    pub fn upsert_technician(&self, technician: Technician) -> Result<(), DispatchError> {
        if technician.name.trim().is_empty() {
            return Err(DispatchError::InvalidInput(
                "technician name cannot be empty".to_string(),
            ));
        }
        if !technician.location.is_valid() {
            return Err(DispatchError::InvalidInput(format!(
                "technician {} has invalid coordinates",
                technician.id
            )));
        }

        let fresh = self
            .technicians
            .insert(technician.id, technician)
            .is_none();
        if fresh {
            self.metrics.technicians_tracked.inc();
        }
        Ok(())
    }

    pub fn deactivate_technician(&self, technician_id: Uuid) -> Result<(), DispatchError> {
        let mut technician = self
            .technicians
            .get_mut(&technician_id)
            .ok_or(DispatchError::UnknownTechnician(technician_id))?;

        technician.active = false;
        technician.updated_at = Utc::now();
        Ok(())
    }

    pub fn technician(&self, technician_id: Uuid) -> Result<Technician, DispatchError> {
        self.technicians
            .get(&technician_id)
            .map(|entry| entry.value().clone())
            .ok_or(DispatchError::UnknownTechnician(technician_id))
    }

    pub fn active_technicians(&self) -> Vec<Technician> {
        self.technicians
            .iter()
            .filter(|entry| entry.value().active)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn upsert_job(&self, job: Job) -> Result<(), DispatchError> {
        if !job.location.is_valid() {
            return Err(DispatchError::InvalidInput(format!(
                "job {} has invalid coordinates",
                job.id
            )));
        }
        if !(job.estimated_hours >= 0.0) {
            return Err(DispatchError::InvalidInput(format!(
                "job {} has a negative estimated duration",
                job.id
            )));
        }

        self.jobs.insert(job.id, job);
        Ok(())
    }

    pub fn job(&self, job_id: Uuid) -> Result<Job, DispatchError> {
        self.jobs
            .get(&job_id)
            .map(|entry| entry.value().clone())
            .ok_or(DispatchError::UnknownJob(job_id))
    }

    pub fn queue_next_job(&self, technician_id: Uuid, job_id: Uuid) -> Result<(), DispatchError> {
        if !self.jobs.contains_key(&job_id) {
            return Err(DispatchError::UnknownJob(job_id));
        }

        let mut technician = self
            .technicians
            .get_mut(&technician_id)
            .ok_or(DispatchError::UnknownTechnician(technician_id))?;

        technician.next_job_id = Some(job_id);
        technician.updated_at = Utc::now();
        Ok(())
    }

    pub fn suggestion(&self, suggestion_id: Uuid) -> Result<Suggestion, DispatchError> {
        self.suggestions
            .get(&suggestion_id)
            .map(|entry| entry.value().clone())
            .ok_or(DispatchError::UnknownSuggestion(suggestion_id))
    }

    pub fn record_outcome(
        &self,
        suggestion_id: Uuid,
        outcome: SuggestionOutcome,
    ) -> Result<(), DispatchError> {
        let mut suggestion = self
            .suggestions
            .get_mut(&suggestion_id)
            .ok_or(DispatchError::UnknownSuggestion(suggestion_id))?;

        let label = if outcome.accepted { "accepted" } else { "rejected" };
        suggestion.outcome = Some(outcome);

        self.metrics
            .suggestion_outcomes_total
            .with_label_values(&[label])
            .inc();
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_events_tx.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<StatusEvent> {
        BroadcastStream::new(self.status_events_tx.subscribe())
    }

    pub(crate) fn publish_transition(
        &self,
        technician_id: Uuid,
        job_id: Option<Uuid>,
        from: TechStatus,
        to: TechStatus,
        trigger: TransitionTrigger,
    ) {
        self.metrics
            .status_transitions_total
            .with_label_values(&[trigger.label(), "applied"])
            .inc();

        let event = StatusEvent {
            technician_id,
            job_id,
            from,
            to,
            trigger,
            occurred_at: Utc::now(),
        };
        let _ = self.status_events_tx.send(event);

        info!(
            technician_id = %technician_id,
            from = ?from,
            to = ?to,
            trigger = trigger.label(),
            "technician status changed"
        );
    }
}
