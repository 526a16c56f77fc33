//! Announcement scheduling
//!
//! This module provides:
//! - **Template**: `{number}`-style placeholder expansion
//! - **Record**: per-display memory of announced and pending tokens
//! - **Scheduler**: the dispatch/suppress decision for a derived view

mod record;
mod scheduler;
mod template;

pub use record::AnnouncementRecord;
pub use scheduler::{AnnounceDecision, Announcement, AnnouncementScheduler, SuppressReason};
pub use template::{TemplateVars, expand_template};
