//! Org chart construction, expand/collapse state and skills gap analysis
//! over a personnel directory.

pub mod config;
pub mod directory;
pub mod error;
pub mod expansion;
pub mod gaps;
pub mod models;
pub mod orgchart;
pub mod report;
pub mod skills;
pub mod store;
