use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobCategory;

pub const PERFORMANCE_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TechStatus {
    Available,
    EnRoute,
    OnSite,
    Complete,
    OffDuty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    pub install: bool,
    pub service: bool,
    pub maintenance: bool,
}

impl SkillSet {
    pub fn covers(&self, category: JobCategory) -> bool {
        match category {
            JobCategory::Install => self.install,
            JobCategory::Service => self.service,
            JobCategory::Maintenance => self.maintenance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_minutes: i64,
}

impl WorkHours {
    pub fn daily_hours(&self) -> f64 {
        let on_shift = (self.end - self.start).num_minutes() - self.lunch_minutes;
        on_shift.max(0) as f64 / 60.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub completed_jobs: u32,
    pub on_time_rate: f64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub location_updated_at: DateTime<Utc>,
    pub status: TechStatus,
    pub current_job_id: Option<Uuid>,
    pub next_job_id: Option<Uuid>,
    pub skills: SkillSet,
    pub work_hours: WorkHours,
    pub performance: PerformanceStats,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::{SkillSet, WorkHours};
    use crate::models::job::JobCategory;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn daily_hours_subtracts_lunch() {
        let hours = WorkHours {
            start: t(8, 0),
            end: t(17, 0),
            lunch_start: t(12, 0),
            lunch_minutes: 60,
        };
        assert_eq!(hours.daily_hours(), 8.0);
    }

    #[test]
    fn daily_hours_never_negative() {
        let hours = WorkHours {
            start: t(9, 0),
            end: t(9, 30),
            lunch_start: t(9, 0),
            lunch_minutes: 60,
        };
        assert_eq!(hours.daily_hours(), 0.0);
    }

    #[test]
    fn skill_set_covers_matching_category_only() {
        let skills = SkillSet {
            install: true,
            service: false,
            maintenance: false,
        };
        assert!(skills.covers(JobCategory::Install));
        assert!(!skills.covers(JobCategory::Service));
        assert!(!skills.covers(JobCategory::Maintenance));
    }
}
