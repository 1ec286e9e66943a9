use chrono::{NaiveDateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::geo;
use crate::models::job::Job;
use crate::models::suggestion::{CustomerTechHistory, RankedTechnician, Suggestion};
use crate::models::technician::{TechStatus, Technician};
use crate::state::EngineState;

const BASE_SCORE: i32 = 50;
const SKILL_BONUS: i32 = 20;
const SKILL_PENALTY: i32 = 30;
const CLOSE_RANGE_MILES: f64 = 5.0;
const CLOSE_RANGE_BONUS: i32 = 25;
const MID_RANGE_MILES: f64 = 15.0;
const MID_RANGE_BONUS: i32 = 15;
const FITS_TODAY_BONUS: i32 = 15;
const OVERBOOKED_PENALTY: i32 = 20;
const AVAILABLE_NOW_BONUS: i32 = 10;
const JUST_FREED_BONUS: i32 = 5;
const PERFORMANCE_MIN_JOBS: u32 = 5;
const PREFERRED_BONUS: i32 = 15;
const REPEAT_CUSTOMER_BONUS: i32 = 5;

#[derive(Debug, Clone)]
pub struct RankCandidate {
    pub technician: Technician,
    pub committed_hours: f64,
    pub customer_history: Option<CustomerTechHistory>,
}

pub fn rank_technicians(
    job: &Job,
    target: NaiveDateTime,
    candidates: &[RankCandidate],
) -> Vec<RankedTechnician> {
    let preferred = preferred_technician(candidates);

    let mut ranked: Vec<RankedTechnician> = candidates
        .iter()
        .map(|candidate| score_candidate(job, target, candidate, preferred))
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

pub fn create_suggestion(
    state: &EngineState,
    job: &Job,
    target: NaiveDateTime,
    candidates: &[RankCandidate],
) -> Result<Suggestion, DispatchError> {
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
    if let Some(candidate) = candidates
        .iter()
        .find(|candidate| !candidate.technician.location.is_valid())
    {
        return Err(DispatchError::InvalidInput(format!(
            "technician {} has invalid coordinates",
            candidate.technician.id
        )));
    }
    if let Some(candidate) = candidates
        .iter()
        .find(|candidate| !(candidate.committed_hours >= 0.0))
    {
        return Err(DispatchError::InvalidInput(format!(
            "technician {} has negative committed hours",
            candidate.technician.id
        )));
    }

    let ranked = rank_technicians(job, target, candidates);

    let suggestion = Suggestion {
        id: Uuid::new_v4(),
        job_id: job.id,
        target_at: target,
        ranked,
        created_at: Utc::now(),
        outcome: None,
    };

    state.suggestions.insert(suggestion.id, suggestion.clone());
    state.metrics.suggestions_generated_total.inc();

    info!(
        suggestion_id = %suggestion.id,
        job_id = %job.id,
        candidates = candidates.len(),
        top_score = suggestion.ranked.first().map(|r| r.score).unwrap_or(0),
        "ranked technicians for job"
    );

    Ok(suggestion)
}

fn score_candidate(
    job: &Job,
    target: NaiveDateTime,
    candidate: &RankCandidate,
    preferred: Option<Uuid>,
) -> RankedTechnician {
    let technician = &candidate.technician;
    let mut score = BASE_SCORE;
    let mut reasons = Vec::new();

    if technician.skills.covers(job.category) {
        score += SKILL_BONUS;
        reasons.push(format!("Has {} capability", job.category.label()));
    } else {
        score -= SKILL_PENALTY;
        reasons.push(format!("Missing {} capability", job.category.label()));
    }

    let distance_miles = geo::distance_miles(&technician.location, &job.location);
    let eta_minutes = geo::drive_time_minutes(distance_miles, Some(target.time()));
    let eta_no_traffic_minutes = (distance_miles * 2.0).floor() as i64;
    if distance_miles < CLOSE_RANGE_MILES {
        score += CLOSE_RANGE_BONUS;
    } else if distance_miles < MID_RANGE_MILES {
        score += MID_RANGE_BONUS;
    }
    reasons.push(format!("{distance_miles:.1} mi away, {eta_minutes} min ETA"));

    let available_hours = technician.work_hours.daily_hours() - candidate.committed_hours;
    if available_hours >= job.estimated_hours {
        score += FITS_TODAY_BONUS;
        reasons.push(format!("{available_hours:.1}h free today"));
    } else {
        score -= OVERBOOKED_PENALTY;
        reasons.push(format!("Only {:.1}h free today", available_hours.max(0.0)));
    }

    match technician.status {
        TechStatus::Available => {
            score += AVAILABLE_NOW_BONUS;
            reasons.push("Available now".to_string());
        }
        TechStatus::Complete => {
            score += JUST_FREED_BONUS;
            reasons.push("Just finished a job".to_string());
        }
        _ => {}
    }

    if technician.performance.completed_jobs >= PERFORMANCE_MIN_JOBS {
        let on_time = technician.performance.on_time_rate;
        if on_time >= 0.9 {
            score += 10;
            reasons.push(format!("{:.0}% on-time rate", on_time * 100.0));
        } else if on_time >= 0.8 {
            score += 5;
            reasons.push(format!("{:.0}% on-time rate", on_time * 100.0));
        } else if on_time < 0.7 {
            score -= 5;
            reasons.push(format!("Only {:.0}% on-time", on_time * 100.0));
        }

        let rating = technician.performance.average_rating;
        if rating >= 4.5 {
            score += 5;
            reasons.push(format!("Rated {rating:.1}"));
        } else if rating < 3.5 {
            score -= 5;
            reasons.push(format!("Low rating {rating:.1}"));
        }
    }

    if let Some(history) = candidate.customer_history {
        if preferred == Some(technician.id) {
            score += PREFERRED_BONUS;
            reasons.insert(0, "Customer's preferred technician".to_string());
        } else if history.jobs_completed >= 1 {
            score += REPEAT_CUSTOMER_BONUS;
            reasons.insert(0, "Has served this customer before".to_string());
        }
    }

    RankedTechnician {
        technician_id: technician.id,
        score: score.clamp(0, 100),
        reasons,
        distance_miles,
        eta_minutes,
        eta_no_traffic_minutes,
    }
}

fn preferred_technician(candidates: &[RankCandidate]) -> Option<Uuid> {
    let mut best: Option<(Uuid, f64)> = None;
    let mut unique = true;

    for candidate in candidates {
        let Some(history) = candidate.customer_history else {
            continue;
        };
        if history.jobs_completed == 0 {
            continue;
        }

        let weight = history.preference_weight();
        match best {
            None => {
                best = Some((candidate.technician.id, weight));
                unique = true;
            }
            Some((_, best_weight)) if weight > best_weight => {
                best = Some((candidate.technician.id, weight));
                unique = true;
            }
            Some((_, best_weight)) if weight == best_weight => {
                unique = false;
            }
            _ => {}
        }
    }

    match best {
        Some((id, _)) if unique => Some(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, Utc};
    use uuid::Uuid;

    use super::{RankCandidate, create_suggestion, rank_technicians};
    use crate::config::EngineConfig;
    use crate::error::DispatchError;
    use crate::models::job::{Job, JobCategory, JobStatus};
    use crate::models::suggestion::CustomerTechHistory;
    use crate::models::technician::{
        GeoPoint, PerformanceStats, SkillSet, TechStatus, Technician, WorkHours,
    };
    use crate::state::EngineState;

    fn target() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn technician(id_seed: u128, lat: f64, lng: f64) -> Technician {
        Technician {
            id: Uuid::from_u128(id_seed),
            name: format!("tech-{id_seed}"),
            location: GeoPoint { lat, lng },
            location_updated_at: Utc::now(),
            status: TechStatus::Available,
            current_job_id: None,
            next_job_id: None,
            skills: SkillSet {
                install: true,
                service: true,
                maintenance: true,
            },
            work_hours: WorkHours {
                start: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                lunch_start: chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                lunch_minutes: 60,
            },
            performance: PerformanceStats::default(),
            active: true,
            updated_at: Utc::now(),
        }
    }

    fn candidate(technician: Technician) -> RankCandidate {
        RankCandidate {
            technician,
            committed_hours: 0.0,
            customer_history: None,
        }
    }

    fn job_at(lat: f64, lng: f64) -> Job {
        Job {
            id: Uuid::from_u128(999),
            location: GeoPoint { lat, lng },
            category: JobCategory::Install,
            estimated_hours: 2.0,
            customer_id: Some(Uuid::from_u128(500)),
            status: JobStatus::Unassigned,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn skilled_technician_outranks_unskilled_twin() {
        let job = job_at(36.0, -115.0);
        let skilled = candidate(technician(1, 36.4, -115.0));
        let mut unskilled_tech = technician(2, 36.4, -115.0);
        unskilled_tech.skills = SkillSet::default();
        let unskilled = candidate(unskilled_tech);

        let ranked = rank_technicians(&job, target(), &[unskilled, skilled]);

        assert_eq!(ranked[0].technician_id, Uuid::from_u128(1));
        assert!(ranked[0].score > ranked[1].score);
        assert_eq!(ranked[0].score - ranked[1].score, 50);
    }

    #[test]
    fn scores_are_clamped_to_the_percent_range() {
        let job = job_at(36.0, -115.0);

        let mut floor_tech = technician(1, 39.0, -115.0);
        floor_tech.skills = SkillSet::default();
        floor_tech.status = TechStatus::OffDuty;
        floor_tech.performance = PerformanceStats {
            completed_jobs: 10,
            on_time_rate: 0.5,
            average_rating: 2.0,
        };
        let mut floor_candidate = candidate(floor_tech);
        floor_candidate.committed_hours = 9.0;

        let mut ceiling_tech = technician(2, 36.01, -115.0);
        ceiling_tech.performance = PerformanceStats {
            completed_jobs: 20,
            on_time_rate: 0.97,
            average_rating: 4.9,
        };
        let mut ceiling_candidate = candidate(ceiling_tech);
        ceiling_candidate.customer_history = Some(CustomerTechHistory {
            jobs_completed: 6,
            average_rating: 4.8,
        });

        let ranked = rank_technicians(&job, target(), &[floor_candidate, ceiling_candidate]);

        assert_eq!(ranked[0].score, 100);
        assert_eq!(ranked[1].score, 0);
    }

    #[test]
    fn closer_technician_outranks_far_twin() {
        let job = job_at(36.0, -115.0);
        let near = candidate(technician(1, 36.01, -115.0));
        let far = candidate(technician(2, 36.4, -115.0));

        let ranked = rank_technicians(&job, target(), &[far, near]);

        assert_eq!(ranked[0].technician_id, Uuid::from_u128(1));
    }

    #[test]
    fn overbooked_technician_is_penalized() {
        let job = job_at(36.0, -115.0);
        let free = candidate(technician(1, 36.4, -115.0));
        let mut booked = candidate(technician(2, 36.4, -115.0));
        booked.committed_hours = 7.5;

        let ranked = rank_technicians(&job, target(), &[booked, free]);

        assert_eq!(ranked[0].technician_id, Uuid::from_u128(1));
        assert_eq!(ranked[0].score - ranked[1].score, 35);
    }

    #[test]
    fn just_freed_technician_scores_between_available_and_busy() {
        let job = job_at(36.0, -115.0);
        let available = candidate(technician(1, 36.4, -115.0));
        let mut freed_tech = technician(2, 36.4, -115.0);
        freed_tech.status = TechStatus::Complete;
        let freed = candidate(freed_tech);
        let mut busy_tech = technician(3, 36.4, -115.0);
        busy_tech.status = TechStatus::OnSite;
        let busy = candidate(busy_tech);

        let ranked = rank_technicians(&job, target(), &[busy, freed, available]);

        assert_eq!(ranked[0].technician_id, Uuid::from_u128(1));
        assert_eq!(ranked[1].technician_id, Uuid::from_u128(2));
        assert_eq!(ranked[2].technician_id, Uuid::from_u128(3));
    }

    #[test]
    fn performance_needs_five_completed_jobs_to_count() {
        let job = job_at(36.0, -115.0);
        let mut plain_tech = technician(1, 36.4, -115.0);
        plain_tech.status = TechStatus::OffDuty;
        let plain = candidate(plain_tech);

        let mut nearly_tech = technician(2, 36.4, -115.0);
        nearly_tech.status = TechStatus::OffDuty;
        nearly_tech.performance = PerformanceStats {
            completed_jobs: 4,
            on_time_rate: 0.99,
            average_rating: 5.0,
        };
        let nearly = candidate(nearly_tech);

        let mut proven_tech = technician(3, 36.4, -115.0);
        proven_tech.status = TechStatus::OffDuty;
        proven_tech.performance = PerformanceStats {
            completed_jobs: 5,
            on_time_rate: 0.95,
            average_rating: 4.8,
        };
        let proven = candidate(proven_tech);

        let ranked = rank_technicians(&job, target(), &[plain, nearly, proven]);

        assert_eq!(ranked[0].technician_id, Uuid::from_u128(3));
        assert_eq!(ranked[1].score, ranked[2].score);
        assert_eq!(ranked[0].score - ranked[1].score, 15);
    }

    #[test]
    fn middling_on_time_rate_is_neutral() {
        let job = job_at(36.0, -115.0);

        let mut neutral_tech = technician(1, 36.4, -115.0);
        neutral_tech.performance = PerformanceStats {
            completed_jobs: 8,
            on_time_rate: 0.75,
            average_rating: 4.0,
        };
        let mut decent_tech = technician(2, 36.4, -115.0);
        decent_tech.performance = PerformanceStats {
            completed_jobs: 8,
            on_time_rate: 0.85,
            average_rating: 4.0,
        };
        let mut late_tech = technician(3, 36.4, -115.0);
        late_tech.performance = PerformanceStats {
            completed_jobs: 8,
            on_time_rate: 0.65,
            average_rating: 4.0,
        };

        let ranked = rank_technicians(
            &job,
            target(),
            &[
                candidate(neutral_tech),
                candidate(decent_tech),
                candidate(late_tech),
            ],
        );

        let score_of = |seed: u128| {
            ranked
                .iter()
                .find(|r| r.technician_id == Uuid::from_u128(seed))
                .unwrap()
                .score
        };
        assert_eq!(score_of(2) - score_of(1), 5);
        assert_eq!(score_of(1) - score_of(3), 5);
    }

    #[test]
    fn unique_preferred_technician_gets_the_top_bonus() {
        let job = job_at(36.0, -115.0);

        let mut favorite_tech = technician(1, 36.4, -115.0);
        favorite_tech.status = TechStatus::OffDuty;
        let mut favorite = candidate(favorite_tech);
        favorite.customer_history = Some(CustomerTechHistory {
            jobs_completed: 5,
            average_rating: 4.0,
        });
        let mut runner_up_tech = technician(2, 36.4, -115.0);
        runner_up_tech.status = TechStatus::OffDuty;
        let mut runner_up = candidate(runner_up_tech);
        runner_up.customer_history = Some(CustomerTechHistory {
            jobs_completed: 3,
            average_rating: 4.5,
        });
        let mut stranger_tech = technician(3, 36.4, -115.0);
        stranger_tech.status = TechStatus::OffDuty;
        let stranger = candidate(stranger_tech);

        let ranked = rank_technicians(&job, target(), &[stranger, runner_up, favorite]);

        let score_of = |seed: u128| {
            ranked
                .iter()
                .find(|r| r.technician_id == Uuid::from_u128(seed))
                .unwrap()
                .score
        };
        assert_eq!(score_of(1) - score_of(3), 15);
        assert_eq!(score_of(2) - score_of(3), 5);
        assert_eq!(ranked[0].reasons[0], "Customer's preferred technician");
    }

    #[test]
    fn tied_preference_weights_drop_the_top_bonus() {
        let job = job_at(36.0, -115.0);

        let mut first_tech = technician(1, 36.4, -115.0);
        first_tech.status = TechStatus::OffDuty;
        let mut first = candidate(first_tech);
        first.customer_history = Some(CustomerTechHistory {
            jobs_completed: 4,
            average_rating: 4.5,
        });
        let mut second_tech = technician(2, 36.4, -115.0);
        second_tech.status = TechStatus::OffDuty;
        let mut second = candidate(second_tech);
        second.customer_history = Some(CustomerTechHistory {
            jobs_completed: 6,
            average_rating: 3.0,
        });

        let ranked = rank_technicians(&job, target(), &[first, second]);

        assert_eq!(ranked[0].score, 90);
        assert_eq!(ranked[1].score, 90);
        assert_eq!(ranked[0].reasons[0], "Has served this customer before");
    }

    #[test]
    fn ties_keep_candidate_order() {
        let job = job_at(36.0, -115.0);
        let twins = vec![
            candidate(technician(1, 36.01, -115.0)),
            candidate(technician(2, 36.01, -115.0)),
            candidate(technician(3, 36.01, -115.0)),
        ];

        let ranked = rank_technicians(&job, target(), &twins);

        let order: Vec<u128> = ranked.iter().map(|r| r.technician_id.as_u128()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn no_candidates_yields_an_empty_ranking() {
        let job = job_at(36.0, -115.0);
        assert!(rank_technicians(&job, target(), &[]).is_empty());
    }

    #[test]
    fn negative_committed_hours_are_rejected_without_recording() {
        let (state, _rx) = EngineState::new(EngineConfig::default());
        let job = job_at(36.0, -115.0);
        let mut booked = candidate(technician(1, 36.01, -115.0));
        booked.committed_hours = -2.0;

        let result = create_suggestion(&state, &job, target(), &[booked]);

        assert!(matches!(result, Err(DispatchError::InvalidInput(_))));
        assert!(state.suggestions.is_empty());
    }

    #[test]
    fn etas_are_attached_with_and_without_traffic() {
        let job = job_at(36.0, -115.0);
        let rush_hour = NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();

        let ranked = rank_technicians(&job, rush_hour, &[candidate(technician(1, 36.1, -115.0))]);

        let top = &ranked[0];
        assert!(top.distance_miles > 5.0);
        assert_eq!(
            top.eta_no_traffic_minutes,
            (top.distance_miles * 2.0).floor() as i64
        );
        assert!(top.eta_minutes > top.eta_no_traffic_minutes);
    }

    #[test]
    fn skilled_and_free_beats_closer_but_compromised_rivals() {
        let job = job_at(36.0, -115.0);

        let mut unskilled_closest_tech = technician(1, 36.007, -115.0);
        unskilled_closest_tech.skills = SkillSet::default();
        let unskilled_closest = candidate(unskilled_closest_tech);

        let mut booked_nearby = candidate(technician(2, 36.075, -115.0));
        booked_nearby.committed_hours = 8.0;

        let skilled_and_free = candidate(technician(3, 36.145, -115.0));

        let ranked = rank_technicians(
            &job,
            target(),
            &[unskilled_closest, booked_nearby, skilled_and_free],
        );

        assert_eq!(ranked[0].technician_id, Uuid::from_u128(3));
    }
}
