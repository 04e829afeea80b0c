use anyhow::{Context, Result};
use monthcal_core::auth::{AuthClient, AuthResponse};
use monthcal_core::config::MonthcalConfig;
use owo_colors::OwoColorize;

use crate::utils::tui::create_spinner;

/// Fields the register form needs a hidden prompt for when not given with `--field`.
const PASSWORD_FIELDS: [(&str, &str); 2] = [("password1", "Password"), ("password2", "Confirm password")];

pub async fn status(config: &MonthcalConfig) -> Result<()> {
    let client = AuthClient::from_config(config)?;

    let spinner = create_spinner("Checking session...".to_string());
    let response = client.check_status().await;
    spinner.finish_and_clear();
    let response = response?;

    println!("{}  {}", "Status".bold(), response.status);
    for (key, value) in &response.extra {
        let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        println!("  {}: {}", key, value.dimmed());
    }

    Ok(())
}

pub async fn login(config: &MonthcalConfig, username: &str, remember_me: bool) -> Result<()> {
    let client = AuthClient::from_config(config)?;
    let password = prompt_password("Password")?;

    let spinner = create_spinner(format!("Logging in as {}...", username));
    let response = client.login(username, &password, remember_me).await;
    spinner.finish_and_clear();
    let response = response?;

    if !response.is_success() {
        print_failure(&response, "Login failed");
        return Ok(());
    }

    println!(
        "{} Logged in as {} (would continue to {})",
        "✓".green(),
        username.bold(),
        response.redirect_or_root()
    );

    // The session lives only as long as this process
    let status = client.check_status().await?;
    println!("  Session: {}", status.status.dimmed());
    client.logout().await?;

    Ok(())
}

pub async fn register(config: &MonthcalConfig, mut fields: Vec<(String, String)>) -> Result<()> {
    for (key, label) in PASSWORD_FIELDS {
        if !fields.iter().any(|(k, _)| k == key) {
            fields.push((key.to_string(), prompt_password(label)?));
        }
    }

    let client = AuthClient::from_config(config)?;

    let spinner = create_spinner("Creating account...".to_string());
    let response = client.register(&fields).await;
    spinner.finish_and_clear();
    let response = response?;

    if !response.is_success() {
        print_failure(&response, "Registration failed");
        return Ok(());
    }

    println!("{} {}", "✓".green(), response.message_or("Account created"));
    Ok(())
}

pub async fn profile(
    config: &MonthcalConfig,
    username: &str,
    fields: Vec<(String, String)>,
) -> Result<()> {
    if fields.is_empty() {
        println!("{}", "Nothing to update. Pass fields with --field key=value".dimmed());
        return Ok(());
    }

    let client = AuthClient::from_config(config)?;
    let password = prompt_password("Password")?;

    let spinner = create_spinner(format!("Logging in as {}...", username));
    let login = client.login(username, &password, false).await;
    spinner.finish_and_clear();
    let login = login?;

    if !login.is_success() {
        print_failure(&login, "Login failed");
        return Ok(());
    }

    let spinner = create_spinner("Updating profile...".to_string());
    let response = client.update_profile(&fields).await;
    spinner.finish_and_clear();

    // Log out even when the update failed
    client.logout().await?;
    let response = response?;

    if !response.is_success() {
        print_failure(&response, "Profile update failed");
        return Ok(());
    }

    println!("{} {}", "✓".green(), response.message_or("Profile updated"));
    Ok(())
}

fn print_failure(response: &AuthResponse, default: &str) {
    println!("{} {}", "✗".red(), response.message_or(default));
    for line in response.error_lines() {
        println!("  {}", line.red());
    }
}

/// Prompt the user for password input (hidden).
fn prompt_password(label: &str) -> Result<String> {
    let prompt = format!("{}: ", label);
    rpassword::prompt_password(&prompt).context("Failed to read password")
}
