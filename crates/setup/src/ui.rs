//! UI helpers for the setup CLI.
//!
//! Provides consistent formatting for console output during provisioning.

use colored::Colorize;

use crate::config::ProvisioningRequest;
use crate::orchestrator::ProvisioningReport;

/// Print the banner.
pub fn print_banner() {
    println!();
    println!("{}", "  CMEK Setup".cyan().bold());
    println!(
        "  {}",
        "Customer-managed encryption keys on Google Cloud".bright_black()
    );
    println!();
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", "═".repeat(70).bright_black());
    println!("{}", title.cyan().bold());
    println!("{}", "═".repeat(70).bright_black());
    println!();
}

/// Print a progress step with step number.
pub fn print_progress_step(current: u8, total: u8, message: &str) {
    println!(
        "{} {} {}",
        format!("[{current}/{total}]").bright_black(),
        "▶".cyan(),
        message.bold()
    );
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print prerequisite check result.
pub fn print_check_result(name: &str, passed: bool) {
    let status = if passed { "✓".green() } else { "✗".red() };
    println!("  {status} {name}");
}

/// Print a key-value pair.
pub fn print_kv(key: &str, value: &str) {
    println!("  {} {}", format!("{key}:").bright_black(), value.green());
}

/// Print a list item.
pub fn print_list_item(item: &str) {
    println!("  {} {item}", "•".bright_black());
}

/// Print the request the operator is about to apply.
pub fn print_request_summary(request: &ProvisioningRequest) {
    print_section("Configuration");
    print_kv("Project", &request.project_id);
    print_kv("Data store location", &request.data_store_location.to_string());
    print_kv("KMS location", &request.kms_location);
    print_kv("Key ring", &request.key_ring_name);
    print_kv("Key", &request.key_name);
    print_kv("Protection level", &request.protection_level.to_string());
}

/// Print the outcome of a completed run.
pub fn print_report_summary(request: &ProvisioningRequest, report: &ProvisioningReport) {
    print_section("SETUP COMPLETE");
    print_kv("Project number", &report.project_number);
    print_kv("Key ring", &report.key_ring.to_string());
    print_kv("Crypto key", &report.crypto_key.to_string());
    print_kv("Key resource", &report.key_resource);
    print_kv("Data store location", &request.data_store_location.to_string());

    println!();
    println!("{}", "Service agents:".bright_black());
    for agent in &report.service_agents {
        print_list_item(agent);
    }

    if !report.is_clean() {
        println!();
        print_warning("Some steps failed and can be retried by running setup again:");
        for failure in &report.soft_failures {
            print_list_item(&format!(
                "{}: {} ({})",
                failure.stage, failure.subject, failure.message
            ));
        }
    }

    println!();
    print_info("Use the key resource above when enabling CMEK in the product admin console.");
    print_info(
        "A \"precondition failed\" error there usually means IAM changes are still \
         propagating; wait a few minutes and try again.",
    );
    println!();
}
