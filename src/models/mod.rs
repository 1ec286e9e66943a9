pub mod job;
pub mod schedule;
pub mod suggestion;
pub mod technician;
