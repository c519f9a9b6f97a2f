//! Core business logic abstractions

pub mod config;
pub mod log;
pub mod notify;
pub mod policy;
pub mod price;

// Re-export main types for cleaner imports
pub use notify::{DeliveryOutcome, MailTransport, NotificationMessage, Notifier, SendError};
pub use policy::{InvestmentDecision, Policy, PolicyError, PolicyKind};
pub use price::{FetchError, PriceSample, PriceSource};
