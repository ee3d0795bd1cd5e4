//! Request handlers, grouped by who can reach them.
//!
//! - [`auth`]: login, registration, guest access, Google sign-in
//! - [`pages`]: dashboard, room catalogue, own payments and profile
//! - [`booking`]: booking form and its submission
//! - [`admin`]: user, room and payment management
pub mod admin;
pub mod auth;
pub mod booking;
pub mod pages;
