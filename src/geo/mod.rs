use chrono::{Local, NaiveTime, Timelike};
use serde::Serialize;

use crate::models::technician::GeoPoint;

const EARTH_RADIUS_MILES: f64 = 3959.0;
const BASE_PACE_MINUTES_PER_MILE: f64 = 2.0;

pub const ARRIVAL_RADIUS_MILES: f64 = 0.0947;

pub fn distance_miles(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_MILES * central_angle
}

pub fn traffic_multiplier(at: Option<NaiveTime>) -> f64 {
    let hour = at.unwrap_or_else(|| Local::now().time()).hour();
    match hour {
        7 | 8 => 1.4,
        9..=11 => 1.1,
        12 => 1.2,
        13..=15 => 1.0,
        16..=18 => 1.5,
        _ => 1.0,
    }
}

pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn traffic_multiplier_for(raw: Option<&str>) -> f64 {
    match raw {
        None => traffic_multiplier(None),
        Some(raw) => match parse_clock(raw) {
            Some(at) => traffic_multiplier(Some(at)),
            None => 1.0,
        },
    }
}

pub fn drive_time_minutes(distance_miles: f64, at: Option<NaiveTime>) -> i64 {
    (distance_miles * BASE_PACE_MINUTES_PER_MILE * traffic_multiplier(at)).floor() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrafficLevel {
    Heavy,
    Moderate,
    Light,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrafficConditions {
    pub level: TrafficLevel,
    pub description: &'static str,
    pub multiplier: f64,
}

pub fn traffic_conditions(at: Option<NaiveTime>) -> TrafficConditions {
    let multiplier = traffic_multiplier(at);
    let (level, description) = if multiplier >= 1.4 {
        (TrafficLevel::Heavy, "heavy traffic, expect delays")
    } else if multiplier >= 1.2 {
        (TrafficLevel::Moderate, "moderate traffic")
    } else {
        (TrafficLevel::Light, "light traffic")
    };

    TrafficConditions {
        level,
        description,
        multiplier,
    }
}

pub fn within_radius(a: &GeoPoint, b: &GeoPoint, radius_miles: f64) -> bool {
    distance_miles(a, b) <= radius_miles
}

pub fn at_job_site(technician: &GeoPoint, job: &GeoPoint) -> bool {
    within_radius(technician, job, ARRIVAL_RADIUS_MILES)
}
