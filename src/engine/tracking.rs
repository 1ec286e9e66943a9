use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::status::{StatusCommand, Transition, apply_command};
use crate::error::DispatchError;
use crate::geo;
use crate::models::technician::{GeoPoint, TechStatus};
use crate::state::{EngineState, TransitionTrigger};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub technician_id: Uuid,
    pub location: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}

pub async fn push_location(state: &EngineState, update: LocationUpdate) -> Result<(), DispatchError> {
    if !update.location.is_valid() {
        return Err(DispatchError::InvalidInput(format!(
            "location update for technician {} has invalid coordinates",
            update.technician_id
        )));
    }

    state.location_tx.send(update).await.map_err(|err| {
        error!(error = %err, "location queue send failed");
        DispatchError::Internal(format!("location queue send failed: {err}"))
    })?;

    state.metrics.location_updates_in_queue.inc();
    Ok(())
}

pub async fn run_location_worker(
    state: Arc<EngineState>,
    mut location_rx: mpsc::Receiver<LocationUpdate>,
) {
    info!("location worker started");

    while let Some(update) = location_rx.recv().await {
        state.metrics.location_updates_in_queue.dec();
        apply_update(&state, update);
    }

    warn!("location worker stopped: queue channel closed");
}

fn apply_update(state: &EngineState, update: LocationUpdate) {
    let Some(mut technician) = state.technicians.get_mut(&update.technician_id) else {
        warn!(
            technician_id = %update.technician_id,
            "location update for unknown technician"
        );
        return;
    };

    technician.location = update.location;
    technician.location_updated_at = update.recorded_at;
    technician.updated_at = Utc::now();

    if technician.status != TechStatus::EnRoute {
        return;
    }
    let Some(job_id) = technician.current_job_id else {
        return;
    };
    let job_location = match state.jobs.get(&job_id) {
        Some(job) => job.location,
        None => return,
    };

    if !geo::within_radius(
        &technician.location,
        &job_location,
        state.config.arrival_radius_miles,
    ) {
        return;
    }

    let transition = apply_command(&mut technician, StatusCommand::Arrive);
    drop(technician);

    if let Transition::Applied { from, to } = transition {
        state.publish_transition(
            update.technician_id,
            Some(job_id),
            from,
            to,
            TransitionTrigger::Geofence,
        );
    }
}
