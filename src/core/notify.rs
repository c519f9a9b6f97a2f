//! Notification composition and delivery abstractions

use crate::core::config::MailConfig;
use crate::core::policy::{InvestmentDecision, PolicyKind};
use crate::core::price::PriceSample;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub const SENDER_NAME: &str = "Bitcoin Investment Alert";

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Invalid mail address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub sender_name: String,
    pub sender_address: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub send: bool,
}

/// Submits a single message; returns the provider's acceptance response.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn submit(&self, message: &NotificationMessage) -> Result<String, SendError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { response: String },
    Suppressed,
}

pub fn subject_for(kind: PolicyKind) -> &'static str {
    match kind {
        PolicyKind::WeeklyBudget => "Bitcoin Weekly Investment Alert",
        PolicyKind::ThresholdBuy => "Bitcoin Dip Buy Alert",
    }
}

pub fn format_body(decision: &InvestmentDecision, sample: &PriceSample) -> String {
    let prices = format!(
        "Current Price: ${:.2}\nMonthly High: ${:.2}\nDip Percentage from Monthly High: {:.2}%",
        sample.current_price, sample.monthly_high, decision.dip_percentage
    );

    match decision.kind {
        PolicyKind::WeeklyBudget => format!(
            "Weekly Bitcoin Investment Plan:\n\n\
             {prices}\n\n\
             Base Investment: ${}\n\
             Additional Investment due to Dip: ${}\n\n\
             Total Suggested Investment for this Week: ${}\n\n\
             Time to execute your weekly investment according to your strategy!",
            decision.base_amount, decision.additional_amount, decision.suggested_amount
        ),
        PolicyKind::ThresholdBuy => format!(
            "Bitcoin Dip Alert:\n\n\
             {prices}\n\n\
             Suggested Investment: ${}\n\n\
             Time to buy the dip according to your strategy!",
            decision.suggested_amount
        ),
    }
}

impl NotificationMessage {
    pub fn compose(decision: &InvestmentDecision, sample: &PriceSample, mail: &MailConfig) -> Self {
        Self {
            sender_name: SENDER_NAME.to_string(),
            sender_address: mail.user.clone(),
            recipient: mail.recipient.clone(),
            subject: subject_for(decision.kind).to_string(),
            body: format_body(decision, sample),
            send: !decision.suppress_notification,
        }
    }
}

pub struct Notifier {
    mail: MailConfig,
    transport: Arc<dyn MailTransport>,
}

impl Notifier {
    pub fn new(mail: MailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { mail, transport }
    }

    pub async fn send(
        &self,
        decision: &InvestmentDecision,
        sample: &PriceSample,
    ) -> Result<DeliveryOutcome, SendError> {
        let message = NotificationMessage::compose(decision, sample, &self.mail);
        if !message.send {
            info!(
                amount = decision.suggested_amount,
                "No dip detected, no email sent"
            );
            return Ok(DeliveryOutcome::Suppressed);
        }

        debug!(subject = %message.subject, "Submitting notification");
        let response = self.transport.submit(&message).await?;
        info!(%response, "Email sent");
        Ok(DeliveryOutcome::Sent { response })
    }
}
