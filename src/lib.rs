//! Timesheet Normalization & Reconciliation Engine
//!
//! This crate turns noisy, OCR-extracted home-health timesheets into
//! canonical, billable records: it resolves partial dates and misread
//! clock times, computes billing units, reconciles employee names against
//! a per-organization roster and validates visit locations against a
//! geofence.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod normalization;
pub mod store;
