use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::technician::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobCategory {
    Install,
    Service,
    Maintenance,
}

impl JobCategory {
    pub fn label(&self) -> &'static str {
        match self {
            JobCategory::Install => "install",
            JobCategory::Service => "service",
            JobCategory::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Unassigned,
    Scheduled,
    InProgress,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub location: GeoPoint,
    pub category: JobCategory,
    pub estimated_hours: f64,
    pub customer_id: Option<Uuid>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn estimated_minutes(&self) -> i64 {
        (self.estimated_hours * 60.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{Job, JobCategory, JobStatus};
    use crate::models::technician::GeoPoint;

    fn job_lasting(hours: f64) -> Job {
        Job {
            id: Uuid::from_u128(1),
            location: GeoPoint { lat: 36.0, lng: -115.0 },
            category: JobCategory::Service,
            estimated_hours: hours,
            customer_id: None,
            status: JobStatus::Unassigned,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn estimated_minutes_rounds_to_the_nearest_minute() {
        assert_eq!(job_lasting(1.75).estimated_minutes(), 105);
        assert_eq!(job_lasting(1.333).estimated_minutes(), 80);
        assert_eq!(job_lasting(0.0).estimated_minutes(), 0);
    }
}
