use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTechnician {
    pub technician_id: Uuid,
    pub score: i32,
    pub reasons: Vec<String>,
    pub distance_miles: f64,
    pub eta_minutes: i64,
    pub eta_no_traffic_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub job_id: Uuid,
    pub target_at: NaiveDateTime,
    pub ranked: Vec<RankedTechnician>,
    pub created_at: DateTime<Utc>,
    pub outcome: Option<SuggestionOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionOutcome {
    pub accepted: bool,
    pub chosen_technician_id: Option<Uuid>,
    pub response_seconds: i64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomerTechHistory {
    pub jobs_completed: u32,
    pub average_rating: f64,
}

impl CustomerTechHistory {
    pub fn preference_weight(&self) -> f64 {
        self.jobs_completed as f64 * self.average_rating
    }
}
