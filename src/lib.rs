pub mod cli;
pub mod core;
pub mod pipeline;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{MailTransport, Notifier, Policy};
use crate::pipeline::RunReport;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Weekly,
    Threshold,
}

impl AppCommand {
    pub fn policy(self) -> Policy {
        match self {
            AppCommand::Weekly => Policy::weekly_budget(),
            AppCommand::Threshold => Policy::threshold_buy(),
        }
    }
}

/// Loads configuration from the environment and runs `command` once.
pub async fn run_command(command: AppCommand, dry_run: bool) -> Result<()> {
    let config = AppConfig::load(dry_run)?;
    debug!("Loaded config: {config:#?}");

    run_with_config(command, &config, None).await?;
    Ok(())
}

/// Runs `command` against `config`. `transport` overrides the SMTP mailer
/// built from the mail config; with no mail config nothing is sent.
pub async fn run_with_config(
    command: AppCommand,
    config: &AppConfig,
    transport: Option<Arc<dyn MailTransport>>,
) -> Result<RunReport> {
    info!(?command, "Dip alert starting...");

    let source = providers::CoinGeckoProvider::new(&config.providers.coingecko_url);
    let notifier = match &config.mail {
        Some(mail) => {
            let transport: Arc<dyn MailTransport> = match transport {
                Some(transport) => transport,
                None => Arc::new(providers::SmtpMailer::new(
                    &config.providers.smtp_relay,
                    mail,
                )?),
            };
            Some(Notifier::new(mail.clone(), transport))
        }
        None => None,
    };

    let report = pipeline::run_pipeline(&command.policy(), &source, notifier.as_ref()).await?;
    println!("{}", report.display_as_table());
    Ok(report)
}
