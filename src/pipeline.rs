//! One run: fetch → compute → notify.

use crate::core::{
    DeliveryOutcome, InvestmentDecision, Notifier, Policy, PriceSample, PriceSource,
};
use crate::cli::ui;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, error, info};

/// What happened to the notification for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent(String),
    Suppressed,
    Failed(String),
    /// Dry run; no transport configured.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub sample: PriceSample,
    pub decision: InvestmentDecision,
    pub delivery: Delivery,
}

/// Clears `pb` once both prices are in, or as soon as either lookup fails.
pub async fn fetch_prices(source: &dyn PriceSource, pb: &ProgressBar) -> Result<PriceSample> {
    let result = source.fetch_sample().await;
    pb.finish_and_clear();
    result.context("Failed to fetch prices")
}

/// Fetch and policy failures abort the run. Mail failures are logged and
/// recorded in the report.
pub async fn run_pipeline(
    policy: &Policy,
    source: &dyn PriceSource,
    notifier: Option<&Notifier>,
) -> Result<RunReport> {
    let pb = ui::new_spinner("Fetching prices...");
    let sample = fetch_prices(source, &pb).await?;
    debug!(?sample, "Fetched price sample");

    let decision = policy
        .evaluate(&sample)
        .context("Failed to compute investment")?;
    info!(
        policy = %policy.kind(),
        dip = %format!("{:.2}", decision.dip_percentage),
        amount = decision.suggested_amount,
        "Computed investment"
    );

    let delivery = match notifier {
        None => Delivery::Skipped,
        Some(notifier) => match notifier.send(&decision, &sample).await {
            Ok(DeliveryOutcome::Sent { response }) => Delivery::Sent(response),
            Ok(DeliveryOutcome::Suppressed) => Delivery::Suppressed,
            Err(e) => {
                error!(error = %e, "Error sending email");
                Delivery::Failed(e.to_string())
            }
        },
    };

    Ok(RunReport {
        sample,
        decision,
        delivery,
    })
}
