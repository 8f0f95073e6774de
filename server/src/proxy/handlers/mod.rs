//! Endpoint handlers, one module per upstream service.

pub mod auth;
pub mod captions;
pub mod common;
pub mod gmail;
pub mod google_calendar;
