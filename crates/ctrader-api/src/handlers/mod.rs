//! HTTP handlers

pub mod campaigns;
pub mod timeseries;
