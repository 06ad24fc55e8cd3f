//! Thin client for the Resend transactional-email API. Delivery itself is an
//! external concern; this module only builds the request and reports the
//! outcome.

use crate::config::Config;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

const CONFIRMATION_SUBJECT: &str = "Your Daily Pain Entry has been recorded!";

const CONFIRMATION_HTML: &str = r#"
        <h1>Thank you for logging your entry!</h1>
        <p>We have successfully recorded your pain tracking data for today.</p>
        <p>Keeping a consistent log is a great step towards understanding and managing your pain.</p>
        <p>See you tomorrow!</p>
        <br/>
        <p>Best regards,<br>The Pain Tracker Team</p>
      "#;

/// Send the fixed-template entry confirmation. Returns Ok(true) if the email
/// was sent, Ok(false) if sending is disabled (no API key configured).
pub async fn send_entry_confirmation(config: &Config, email: &str) -> anyhow::Result<bool> {
    if config.resend_api_key.is_empty() {
        tracing::warn!("RESEND_API_KEY not set, skipping confirmation email");
        return Ok(false);
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let response = client
        .post(RESEND_API_URL)
        .bearer_auth(&config.resend_api_key)
        .json(&serde_json::json!({
            "from": config.email_from,
            "to": [email],
            "subject": CONFIRMATION_SUBJECT,
            "html": CONFIRMATION_HTML,
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Resend API error {}: {}", status, body);
    }

    tracing::info!(to = %email, "Confirmation email sent");
    Ok(true)
}
