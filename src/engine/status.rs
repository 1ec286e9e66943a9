use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::technician::{TechStatus, Technician};
use crate::state::{EngineState, TransitionTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCommand {
    Start(Uuid),
    Arrive,
    Complete(Uuid),
    GoOffDuty,
    GoOnDuty,
}

impl StatusCommand {
    pub fn name(&self) -> &'static str {
        match self {
            StatusCommand::Start(_) => "start",
            StatusCommand::Arrive => "arrive",
            StatusCommand::Complete(_) => "complete",
            StatusCommand::GoOffDuty => "go_off_duty",
            StatusCommand::GoOnDuty => "go_on_duty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied {
        from: TechStatus,
        to: TechStatus,
    },
    NotInExpectedState {
        command: &'static str,
        status: TechStatus,
    },
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

pub fn apply_command(technician: &mut Technician, command: StatusCommand) -> Transition {
    let from = technician.status;
    let rejected = Transition::NotInExpectedState {
        command: command.name(),
        status: from,
    };

    match command {
        StatusCommand::Start(job_id) => {
            technician.status = TechStatus::EnRoute;
            if technician.next_job_id == Some(job_id) {
                technician.next_job_id = None;
            }
            technician.current_job_id = Some(job_id);
        }
        StatusCommand::Arrive => {
            if from != TechStatus::EnRoute {
                return rejected;
            }
            technician.status = TechStatus::OnSite;
        }
        StatusCommand::Complete(job_id) => {
            if !matches!(from, TechStatus::OnSite | TechStatus::EnRoute) {
                return rejected;
            }
            if technician.current_job_id.is_some_and(|current| current != job_id) {
                return rejected;
            }
            technician.status = TechStatus::Available;
            technician.current_job_id = technician.next_job_id.take();
        }
        StatusCommand::GoOffDuty => {
            technician.status = TechStatus::OffDuty;
            technician.current_job_id = None;
            technician.next_job_id = None;
        }
        StatusCommand::GoOnDuty => {
            if from != TechStatus::OffDuty {
                return rejected;
            }
            technician.status = TechStatus::Available;
        }
    }

    technician.updated_at = Utc::now();
    Transition::Applied {
        from,
        to: technician.status,
    }
}

pub fn apply_status_command(
    state: &EngineState,
    technician_id: Uuid,
    command: StatusCommand,
) -> Result<Transition, DispatchError> {
    let mut technician = state
        .technicians
        .get_mut(&technician_id)
        .ok_or(DispatchError::UnknownTechnician(technician_id))?;

    let event_job = match command {
        StatusCommand::Start(job_id) | StatusCommand::Complete(job_id) => Some(job_id),
        StatusCommand::Arrive => technician.current_job_id,
        StatusCommand::GoOffDuty | StatusCommand::GoOnDuty => None,
    };

    let transition = apply_command(&mut technician, command);
    drop(technician);

    match transition {
        Transition::Applied { from, to } => {
            state.publish_transition(technician_id, event_job, from, to, TransitionTrigger::Command);
        }
        Transition::NotInExpectedState { command, status } => {
            state
                .metrics
                .status_transitions_total
                .with_label_values(&[TransitionTrigger::Command.label(), "rejected"])
                .inc();
            warn!(
                technician_id = %technician_id,
                command,
                status = ?status,
                "status command rejected"
            );
        }
    }

    Ok(transition)
}
