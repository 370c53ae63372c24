//! Gmail SMTP integration
//!
//! Lightweight async SMTP client used to deliver the weather reports.
//! Supports STARTTLS on port 587 and implicit TLS on port 465.

mod smtp_client;

pub use smtp_client::{EmailError, SmtpClient, SmtpConfig};
