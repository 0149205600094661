//! Module for user profile and management API endpoints.
//!
//! This module handles functionalities related to user information that is
//! distinct from the core authentication process, such as retrieving the
//! identity and role behind the current session.

pub mod handlers;
pub mod routes;
