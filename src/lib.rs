//! Lead Intake API Library
//!
//! Backend for a law-office marketing site: receives contact-form
//! submissions, screens them (rate limiting, honeypot, reCAPTCHA, content
//! validation) and forwards valid leads to the configured CRM (Brevo or
//! HubSpot).
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `mapping`: Lead-to-CRM attribute mapping.
//! - `models`: Wire and domain data models.
//! - `rate_limit`: Fixed-window submission rate limiter.
//! - `recaptcha`: reCAPTCHA siteverify client.
//! - `services`: CRM API clients (Brevo, HubSpot).
//! - `validation`: Honeypot and contact-data validation.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod mapping;
pub mod models;
pub mod rate_limit;
pub mod recaptcha;
pub mod services;
pub mod validation;
