use super::ui;
use crate::core::PolicyKind;
use crate::pipeline::{Delivery, RunReport};

impl Delivery {
    pub fn summary_line(&self) -> String {
        match self {
            Delivery::Sent(response) => format!("Email sent: {response}"),
            Delivery::Suppressed => "No email sent: no dip detected".to_string(),
            Delivery::Failed(error) => format!("Email failed: {error}"),
            Delivery::Skipped => "Dry run: email skipped".to_string(),
        }
    }
}

impl RunReport {
    pub fn display_as_table(&self) -> String {
        let decision = &self.decision;
        let mut table = ui::new_styled_table();

        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        table.add_row(vec![
            ui::label_cell("Current Price"),
            ui::value_cell(format!("${:.2}", self.sample.current_price)),
        ]);
        table.add_row(vec![
            ui::label_cell("Monthly High"),
            ui::value_cell(format!("${:.2}", self.sample.monthly_high)),
        ]);
        table.add_row(vec![
            ui::label_cell("Dip Percentage"),
            ui::dip_cell(decision.dip_percentage),
        ]);

        table.add_row(vec![
            ui::label_cell("Matched Tier"),
            ui::value_cell(decision.tier.map_or("none".to_string(), |t| t.to_string())),
        ]);

        let amount_label = match decision.kind {
            PolicyKind::WeeklyBudget => {
                table.add_row(vec![
                    ui::label_cell("Base Investment"),
                    ui::value_cell(format!("${}", decision.base_amount)),
                ]);
                table.add_row(vec![
                    ui::label_cell("Additional Investment due to Dip"),
                    ui::value_cell(format!("${}", decision.additional_amount)),
                ]);
                "Total Investment Amount"
            }
            PolicyKind::ThresholdBuy => "Suggested Investment",
        };
        table.add_row(vec![
            ui::label_cell(amount_label),
            ui::amount_cell(decision.suggested_amount),
        ]);

        let mut output = format!(
            "Policy: {}\n\n",
            ui::style_text(&decision.kind.to_string(), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());

        let delivery_style = match self.delivery {
            Delivery::Sent(_) => ui::StyleType::TotalValue,
            Delivery::Failed(_) => ui::StyleType::Error,
            Delivery::Suppressed | Delivery::Skipped => ui::StyleType::Subtle,
        };
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(&self.delivery.summary_line(), delivery_style)
        ));

        output
    }
}
