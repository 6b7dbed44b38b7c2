//! Health command implementation
//!
//! Prints run-history statistics and the highest-priority alert. Exits with
//! code 1 while an alert condition holds so schedulers can page on it.

use super::{connect_stores, load_or_report, EXIT_FAILED, EXIT_FATAL, EXIT_OK};
use crate::core::health::{AlertDecision, HealthMonitor};
use clap::Args;

/// Arguments for the health command
#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Override health.window_hours
    #[arg(long, value_name = "HOURS")]
    pub window_hours: Option<u32>,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}

impl HealthArgs {
    /// Execute the health command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        if let Some(hours) = self.window_hours.filter(|h| *h > 0) {
            config.health.window_hours = hours;
        }
        tracing::info!(window_hours = config.health.window_hours, "Checking sync health");

        let stores = match connect_stores(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let monitor = HealthMonitor::new(stores.runs, config.health.clone());
        let decision = match monitor.check_and_alert().await {
            Ok(d) => d,
            Err(e) => {
                println!("❌ Failed to evaluate sync health");
                println!("   Error: {}", e);
                return Ok(EXIT_FATAL);
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&decision)?);
        } else {
            print_decision(&decision);
        }

        Ok(if decision.should_alert {
            EXIT_FAILED
        } else {
            EXIT_OK
        })
    }
}

fn print_decision(decision: &AlertDecision) {
    let stats = &decision.stats;
    println!("🩺 Sync Health (last {} hours)", stats.window_hours);
    println!();
    println!("  Runs: {}", stats.total_runs);
    println!("  Completed: {}", stats.completed);
    println!("  Failed: {}", stats.failed);
    println!("  Timed out: {}", stats.timed_out);
    println!("  Cancelled: {}", stats.cancelled);
    println!("  In progress: {}", stats.in_progress);
    println!("  Success rate: {:.1}%", stats.success_rate);
    if let Some(avg) = stats.avg_duration_ms {
        println!("  Average duration: {:.1}s", avg as f64 / 1000.0);
    }
    println!("  Consecutive failures: {}", stats.consecutive_failures);
    match stats.last_success_at {
        Some(at) => println!("  Last success: {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => println!("  Last success: never"),
    }
    println!();

    match (&decision.alert_type, &decision.message) {
        (Some(alert), Some(message)) => {
            println!("🚨 ALERT [{alert}]: {message}");
            for warning in stats.warnings.iter().skip(1) {
                println!("   also: {warning}");
            }
        }
        _ => println!("✅ Healthy"),
    }
}
