//! netlog - outage analysis for multi-layer connectivity sample logs.
//!
//! Reads the CSV log written by the connectivity prober, groups consecutive
//! failing samples into outages, correlates them with captured trace dumps
//! and summarises where in the network path failures concentrate.

pub mod analyze;
pub mod classify;
pub mod config;
pub mod outage;
pub mod render;
pub mod report;
pub mod sample;
pub mod trace;
