#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

use crate::batch::BatchReport;

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn format(report: &BatchReport) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                 IMPLIED DISTRIBUTION SCORES                   \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        // Coverage
        output.push_str("Coverage\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "Events Scored:         {}\n",
            report.aggregate.events_scored
        ));
        output.push_str(&format!(
            "Events Skipped:        {}\n",
            report.skip_counts.total()
        ));
        output.push_str(&format!(
            "  Insufficient Strikes:   {}\n",
            report.skip_counts.insufficient_strikes
        ));
        output.push_str(&format!(
            "  Unparsable Outcome:     {}\n",
            report.skip_counts.unparsable_outcome
        ));
        output.push_str(&format!(
            "  Insufficient Snapshots: {}\n",
            report.skip_counts.insufficient_snapshots
        ));
        output.push_str(&format!(
            "  Scoring Failed:         {}\n",
            report.skip_counts.scoring_failed
        ));
        output.push_str(&format!(
            "Markets Dropped:       {} unusable, {} duplicate\n",
            report.dropped_markets, report.duplicate_strikes
        ));
        output.push('\n');

        // Mean CRPS
        let agg = &report.aggregate;
        output.push_str("Mean CRPS (lower is better)\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Market Implied:        {}\n", fmt_opt(agg.mean_market_crps)));
        output.push_str(&format!("Uniform:               {}\n", fmt_opt(agg.mean_uniform_crps)));
        output.push_str(&format!(
            "Historical:            {} ({} events)\n",
            fmt_opt(agg.mean_historical_crps),
            agg.events_with_history
        ));
        output.push_str(&format!(
            "Point (interior mean): {}\n",
            fmt_opt(agg.mean_point_interior_crps)
        ));
        output.push_str(&format!(
            "Point (tail-aware):    {}\n",
            fmt_opt(agg.mean_point_tail_aware_crps)
        ));
        output.push_str(&format!(
            "Market - Uniform:      {}\n",
            fmt_opt(agg.mean_market_minus_uniform)
        ));
        output.push_str(&format!(
            "Market - Historical:   {}\n",
            fmt_opt(agg.mean_market_minus_historical)
        ));
        output.push('\n');

        // Arbitrage
        let v = &report.violations;
        output.push_str("Monotonicity Violations\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Snapshots:             {}\n", v.total_snapshots));
        output.push_str(&format!(
            "Violating:             {} ({:.2}%)\n",
            v.violating_snapshots,
            v.violation_rate * 100.0
        ));
        output.push_str(&format!("Mean Magnitude:        {}\n", fmt_opt(v.mean_magnitude)));
        output.push_str(&format!("Median Magnitude:      {}\n", fmt_opt(v.median_magnitude)));
        output.push_str(&format!(
            "Reversion Rate:        {} ({} reverted, {} persisted)\n",
            v.reversion_rate
                .map_or_else(|| "n/a".to_string(), |r| format!("{:.2}%", r * 100.0)),
            v.reverted,
            v.persisted
        ));
        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        output
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.6}", v))
}
