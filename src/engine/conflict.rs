use chrono::{Duration, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::models::schedule::ScheduleEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    Strict,
    Buffered(i64),
}

#[derive(Debug, Clone, Copy)]
pub struct CandidateWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub entry_id: Uuid,
    pub job_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub fn overlaps(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn overlaps_with_buffer(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
    buffer_minutes: i64,
) -> bool {
    overlaps(a_start, a_end, b_start, extend_end(b_end, buffer_minutes))
}

fn extend_end(end: NaiveTime, minutes: i64) -> NaiveTime {
    let (extended, wrapped_seconds) = end.overflowing_add_signed(Duration::minutes(minutes.max(0)));
    if wrapped_seconds > 0 {
        NaiveTime::from_hms_opt(23, 59, 59).expect("valid end-of-day clamp")
    } else {
        extended
    }
}

pub fn find_conflicts(
    candidate: &CandidateWindow,
    existing: &[ScheduleEntry],
    policy: OverlapPolicy,
) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|entry| entry.is_active())
        .filter(|entry| match policy {
            OverlapPolicy::Strict => overlaps(
                candidate.start,
                candidate.end,
                entry.start_time,
                entry.end_time,
            ),
            OverlapPolicy::Buffered(gap_minutes) => overlaps_with_buffer(
                candidate.start,
                candidate.end,
                entry.start_time,
                entry.end_time,
                gap_minutes,
            ),
        })
        .map(|entry| Conflict {
            entry_id: entry.id,
            job_id: entry.job_id,
            start_time: entry.start_time,
            end_time: entry.end_time,
        })
        .collect()
}
