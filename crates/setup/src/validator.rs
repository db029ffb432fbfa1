//! Prerequisite checks run before any prompt.
//!
//! The `gcloud` CLI is required unless an access token is provided through
//! the environment.

use anyhow::Result;
use colored::Colorize;

use cmek_cloud::auth::ACCESS_TOKEN_ENV;

use crate::ui;

/// Validates prerequisites for provisioning.
pub struct PrerequisitesValidator {
    requirements: Vec<Requirement>,
}

struct Requirement {
    name: String,
    check: Box<dyn Fn() -> bool>,
    install_instructions: String,
    critical: bool,
}

impl PrerequisitesValidator {
    /// Create a validator for the tools the provisioner relies on.
    #[must_use]
    pub fn new() -> Self {
        let token_provided = std::env::var(ACCESS_TOKEN_ENV)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);

        Self::with_requirements(vec![Requirement {
            name: "gcloud CLI".to_string(),
            check: Box::new(|| which::which("gcloud").is_ok()),
            install_instructions: format!(
                "Install the Google Cloud CLI from https://cloud.google.com/sdk/docs/install \
                 or set {ACCESS_TOKEN_ENV}"
            ),
            // The CLI is only the token source; a provided token makes it optional
            critical: !token_provided,
        }])
    }

    fn with_requirements(requirements: Vec<Requirement>) -> Self {
        Self { requirements }
    }

    /// Run every check and print the results.
    ///
    /// # Errors
    /// Returns an error if a critical requirement is not met.
    pub fn validate(&self) -> Result<()> {
        let mut failures = Vec::new();

        for requirement in &self.requirements {
            let passed = (requirement.check)();
            ui::print_check_result(&requirement.name, passed);
            if !passed {
                failures.push(requirement);
            }
        }

        if failures.is_empty() {
            return Ok(());
        }

        println!();
        for failure in &failures {
            if failure.critical {
                println!(
                    "  {} {} - {}",
                    "✗".red(),
                    failure.name.red(),
                    failure.install_instructions.bright_black()
                );
            } else {
                println!(
                    "  {} {} - {}",
                    "⚠".yellow(),
                    failure.name.yellow(),
                    failure.install_instructions.bright_black()
                );
            }
        }
        println!();

        if failures.iter().any(|f| f.critical) {
            return Err(anyhow::anyhow!(
                "Critical prerequisites not met. Please install the required tools and try again."
            ));
        }

        Ok(())
    }
}

impl Default for PrerequisitesValidator {
    fn default() -> Self {
        Self::new()
    }
}
