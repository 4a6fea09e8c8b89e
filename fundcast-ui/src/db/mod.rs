//! Local persistence for fundcast-ui

pub mod reports;
