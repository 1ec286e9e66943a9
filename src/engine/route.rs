use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo;
use crate::models::schedule::ScheduleEntry;
use crate::models::technician::GeoPoint;

pub trait TravelTimeProvider {
    fn travel_minutes(&self, from: &GeoPoint, to: &GeoPoint) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineEstimator {
    time_of_day: Option<NaiveTime>,
}

impl HaversineEstimator {
    pub fn at(time_of_day: NaiveTime) -> Self {
        Self {
            time_of_day: Some(time_of_day),
        }
    }
}

impl TravelTimeProvider for HaversineEstimator {
    fn travel_minutes(&self, from: &GeoPoint, to: &GeoPoint) -> i64 {
        geo::drive_time_minutes(geo::distance_miles(from, to), self.time_of_day)
    }
}

pub struct TravelTimeMatrix {
    index: HashMap<String, usize>,
    minutes: Vec<Vec<i64>>,
    fallback: HaversineEstimator,
}

impl TravelTimeMatrix {
    pub fn build(locations: &[GeoPoint], estimator: HaversineEstimator) -> Self {
        let mut index = HashMap::new();
        let mut unique = Vec::new();
        for location in locations {
            let key = location_key(location);
            if !index.contains_key(&key) {
                index.insert(key, unique.len());
                unique.push(*location);
            }
        }

        let minutes = unique
            .iter()
            .map(|from| {
                unique
                    .iter()
                    .map(|to| estimator.travel_minutes(from, to))
                    .collect()
            })
            .collect();

        Self {
            index,
            minutes,
            fallback: estimator,
        }
    }
}

impl TravelTimeProvider for TravelTimeMatrix {
    fn travel_minutes(&self, from: &GeoPoint, to: &GeoPoint) -> i64 {
        let from_idx = self.index.get(&location_key(from));
        let to_idx = self.index.get(&location_key(to));
        match (from_idx, to_idx) {
            (Some(&f), Some(&t)) => self.minutes[f][t],
            _ => self.fallback.travel_minutes(from, to),
        }
    }
}

fn location_key(point: &GeoPoint) -> String {
    format!("{:.6},{:.6}", point.lat, point.lng)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stop {
    pub job_id: Uuid,
    pub location: GeoPoint,
    pub service_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledStop {
    pub stop: Stop,
    pub order: u32,
    pub travel_minutes: i64,
    pub arrival: NaiveTime,
    pub departure: NaiveTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizedRoute {
    pub stops: Vec<ScheduledStop>,
    pub total_travel_minutes: i64,
    pub original_travel_minutes: i64,
    pub time_saved_minutes: i64,
}

impl OptimizedRoute {
    pub fn schedule_entries(&self, technician_id: Uuid, date: NaiveDate) -> Vec<ScheduleEntry> {
        self.stops
            .iter()
            .map(|scheduled| ScheduleEntry {
                id: Uuid::new_v4(),
                technician_id,
                job_id: scheduled.stop.job_id,
                date,
                start_time: scheduled.arrival,
                end_time: scheduled.departure,
                order: scheduled.order,
                canceled: false,
            })
            .collect()
    }
}

pub fn optimize_route(stops: &[Stop], start: Option<GeoPoint>, depart_at: NaiveTime) -> OptimizedRoute {
    let estimator = HaversineEstimator::at(depart_at);
    let mut locations: Vec<GeoPoint> = stops.iter().map(|stop| stop.location).collect();
    if let Some(base) = start {
        locations.push(base);
    }
    let matrix = TravelTimeMatrix::build(&locations, estimator);
    optimize_route_with(stops, start, depart_at, &matrix)
}

pub fn optimize_route_with(
    stops: &[Stop],
    start: Option<GeoPoint>,
    depart_at: NaiveTime,
    travel: &dyn TravelTimeProvider,
) -> OptimizedRoute {
    if stops.len() < 2 {
        let legs = vec![0; stops.len()];
        let order: Vec<usize> = (0..stops.len()).collect();
        let scheduled = schedule_stops(stops, &order, &legs, depart_at);
        return OptimizedRoute {
            stops: scheduled,
            total_travel_minutes: 0,
            original_travel_minutes: 0,
            time_saved_minutes: 0,
        };
    }

    let order = nearest_neighbor_order(stops, start, travel);
    let legs = leg_minutes(stops, &order, start, travel);
    let total_travel_minutes: i64 = legs.iter().sum();

    let input_order: Vec<usize> = (0..stops.len()).collect();
    let input_legs = leg_minutes(stops, &input_order, start, travel);
    let original_travel_minutes: i64 = input_legs.iter().sum();

    let scheduled = schedule_stops(stops, &order, &legs, depart_at);

    OptimizedRoute {
        stops: scheduled,
        total_travel_minutes,
        original_travel_minutes,
        time_saved_minutes: (original_travel_minutes - total_travel_minutes).max(0),
    }
}

fn nearest_neighbor_order(
    stops: &[Stop],
    start: Option<GeoPoint>,
    travel: &dyn TravelTimeProvider,
) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());
    let mut current = start;

    while !remaining.is_empty() {
        let pick = match current {
            Some(from) => {
                let mut best = 0;
                let mut best_minutes = i64::MAX;
                for (pos, &idx) in remaining.iter().enumerate() {
                    let minutes = travel.travel_minutes(&from, &stops[idx].location);
                    if minutes < best_minutes {
                        best = pos;
                        best_minutes = minutes;
                    }
                }
                best
            }
            None => 0,
        };
        let idx = remaining.remove(pick);
        current = Some(stops[idx].location);
        order.push(idx);
    }

    order
}

fn leg_minutes(
    stops: &[Stop],
    order: &[usize],
    start: Option<GeoPoint>,
    travel: &dyn TravelTimeProvider,
) -> Vec<i64> {
    let mut legs = Vec::with_capacity(order.len());
    let mut current = start;
    for &idx in order {
        let leg = match current {
            Some(from) => travel.travel_minutes(&from, &stops[idx].location),
            None => 0,
        };
        legs.push(leg);
        current = Some(stops[idx].location);
    }
    legs
}

fn schedule_stops(
    stops: &[Stop],
    order: &[usize],
    legs: &[i64],
    depart_at: NaiveTime,
) -> Vec<ScheduledStop> {
    let mut clock = depart_at;
    order
        .iter()
        .zip(legs)
        .enumerate()
        .map(|(position, (&idx, &leg))| {
            let stop = stops[idx];
            let arrival = advance(clock, leg);
            let departure = advance(arrival, stop.service_minutes.max(0));
            clock = departure;
            ScheduledStop {
                stop,
                order: position as u32 + 1,
                travel_minutes: leg,
                arrival,
                departure,
            }
        })
        .collect()
}

fn advance(clock: NaiveTime, minutes: i64) -> NaiveTime {
    let (advanced, wrapped_seconds) = clock.overflowing_add_signed(Duration::minutes(minutes));
    if wrapped_seconds > 0 {
        NaiveTime::from_hms_opt(23, 59, 59).expect("valid end-of-day clamp")
    } else {
        advanced
    }
}
