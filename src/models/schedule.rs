use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub job_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub order: u32,
    pub canceled: bool,
}

impl ScheduleEntry {
    pub fn is_active(&self) -> bool {
        !self.canceled
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_minutes().max(0) as f64 / 60.0
    }
}

pub fn committed_hours(entries: &[ScheduleEntry]) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.is_active())
        .map(ScheduleEntry::duration_hours)
        .sum()
}
