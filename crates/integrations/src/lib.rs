//! Outbound adapters implementing the core ports.
//!
//! - [`CbrRateProvider`] reads the key rate from the central bank SOAP service
//! - [`EmailNotifier`] delivers notifications as plain-text email

pub mod cbr;
pub mod email_notifier;

pub use cbr::CbrRateProvider;
pub use email_notifier::EmailNotifier;
