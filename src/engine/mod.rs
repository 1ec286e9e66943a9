pub mod conflict;
pub mod ranking;
pub mod route;
pub mod status;
pub mod tracking;
