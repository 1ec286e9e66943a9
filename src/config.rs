use std::env;

use crate::engine::conflict::OverlapPolicy;
use crate::error::DispatchError;
use crate::geo::ARRIVAL_RADIUS_MILES;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub location_queue_size: usize,
    pub event_buffer_size: usize,
    pub arrival_radius_miles: f64,
    pub booking_gap_minutes: i64,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, DispatchError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            location_queue_size: parse_or_default("LOCATION_QUEUE_SIZE", 1024)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            arrival_radius_miles: parse_or_default("ARRIVAL_RADIUS_MILES", ARRIVAL_RADIUS_MILES)?,
            booking_gap_minutes: parse_or_default("BOOKING_GAP_MINUTES", 15)?,
        })
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        OverlapPolicy::Buffered(self.booking_gap_minutes)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            location_queue_size: 1024,
            event_buffer_size: 1024,
            arrival_radius_miles: ARRIVAL_RADIUS_MILES,
            booking_gap_minutes: 15,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, DispatchError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T, DispatchError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| DispatchError::InvalidInput(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}
