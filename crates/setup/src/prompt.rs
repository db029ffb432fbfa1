//! Interactive collection of the provisioning request.

use std::str::FromStr;

use cmek_cloud::ProtectionLevel;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use thiserror::Error;

use crate::config::{
    DataStoreLocation, ProvisioningRequest, DEFAULT_KEY_NAME, DEFAULT_KEY_RING_NAME, KMS_LOCATION,
};
use crate::ui;

/// Errors while collecting input.
#[derive(Error, Debug)]
pub enum PromptError {
    /// No project ID was entered.
    #[error("Project ID is required")]
    MissingProjectId,

    /// The terminal could not be read.
    #[error("Failed to read input: {0}")]
    Io(#[from] dialoguer::Error),
}

/// Source of operator answers.
pub trait Prompter {
    /// Ask for a line of text. An empty answer yields `default` when given.
    ///
    /// # Errors
    /// Returns an error if input cannot be read.
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Ask a yes/no question.
    ///
    /// # Errors
    /// Returns an error if input cannot be read.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, PromptError>;
}

/// Prompts on the terminal with `dialoguer`.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    /// Create a terminal prompter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}

/// Ask until the answer parses. Invalid answers are reported and asked again.
fn ask_until_valid<T, P>(
    prompter: &mut P,
    prompt: &str,
    default: Option<&str>,
) -> Result<T, PromptError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    P: Prompter + ?Sized,
{
    loop {
        let answer = prompter.input(prompt, default)?;
        let answer = match (answer.trim(), default) {
            ("", Some(default)) => default.to_string(),
            (answer, _) => answer.to_string(),
        };

        match answer.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => ui::print_error(&e.to_string()),
        }
    }
}

/// Ask for a name, falling back to `default` on an empty answer.
fn ask_name<P: Prompter + ?Sized>(
    prompter: &mut P,
    prompt: &str,
    default: &str,
) -> Result<String, PromptError> {
    let answer = prompter.input(prompt, Some(default))?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Collect a provisioning request from the operator.
///
/// # Errors
/// Returns [`PromptError::MissingProjectId`] if the project ID is empty.
pub fn collect_request<P: Prompter + ?Sized>(
    prompter: &mut P,
) -> Result<ProvisioningRequest, PromptError> {
    println!();
    println!("{}", "Let's configure your customer-managed encryption key.".cyan().bold());
    println!();

    let project_id = prompter.input("Google Cloud project ID", None)?;
    let project_id = project_id.trim().to_string();
    if project_id.is_empty() {
        return Err(PromptError::MissingProjectId);
    }

    let data_store_location: DataStoreLocation =
        ask_until_valid(prompter, "Data store location (us or eu)", None)?;

    let key_ring_name = ask_name(prompter, "Key ring name", DEFAULT_KEY_RING_NAME)?;
    let key_name = ask_name(prompter, "Key name", DEFAULT_KEY_NAME)?;

    let default_level = ProtectionLevel::default().to_string();
    let protection_level: ProtectionLevel = ask_until_valid(
        prompter,
        "Protection level (hsm or software)",
        Some(default_level.as_str()),
    )?;

    Ok(ProvisioningRequest {
        project_id,
        key_ring_name,
        key_name,
        protection_level,
        kms_location: KMS_LOCATION.to_string(),
        data_store_location,
    })
}
