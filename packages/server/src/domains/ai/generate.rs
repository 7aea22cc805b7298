//! AI content generation: pitch emails, subject line alternatives, and
//! draft rewrites. Prompts are built here; the completion call goes
//! through the kernel AI client.

use serde::{Deserialize, Serialize};

use crate::common::ApiError;
use crate::domains::contacts::models::Contact;
use crate::kernel::ai::Ai;

/// A generated pitch email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchDraft {
    pub subject: String,
    pub body: String,
}

fn pitch_prompt(contact: &Contact, track_description: Option<&str>) -> String {
    let mut prompt = format!(
        "Write a short, personalized pitch email for a music promoter reaching out to a contact.\n\
         Contact name: {}\n\
         Contact type: {}\n",
        contact.name, contact.contact_kind
    );
    if let Some(outlet) = &contact.outlet {
        prompt.push_str(&format!("Outlet: {}\n", outlet));
    }
    if let Some(description) = track_description {
        prompt.push_str(&format!("The release being pitched: {}\n", description));
    }
    prompt.push_str(
        "\nKeep it under 150 words, friendly and specific, no hype words.\n\
         Respond with only a JSON object: {\"subject\": \"...\", \"body\": \"...\"}",
    );
    prompt
}

fn subject_lines_prompt(subject: &str, body: &str, count: usize) -> String {
    format!(
        "Here is an email a music promoter is about to send.\n\
         Subject: {}\n\
         Body:\n{}\n\n\
         Suggest {} alternative subject lines that would get this email opened.\n\
         Respond with only a JSON array of strings.",
        subject, body, count
    )
}

fn improve_prompt(body: &str, instructions: &str) -> String {
    format!(
        "Rewrite the following email draft. Instructions: {}\n\
         Keep any {{{{placeholder}}}} variables exactly as they are.\n\n\
         Draft:\n{}\n\n\
         Respond with only the rewritten draft, no commentary.",
        instructions, body
    )
}

fn upstream(err: impl std::fmt::Display) -> ApiError {
    ApiError::Upstream(format!("AI generation failed: {}", err))
}

/// Generate a pitch email for a contact.
pub async fn generate_pitch(
    ai: &dyn Ai,
    contact: &Contact,
    track_description: Option<&str>,
) -> Result<PitchDraft, ApiError> {
    let response = ai
        .complete_json(&pitch_prompt(contact, track_description))
        .await
        .map_err(upstream)?;
    parse_pitch(&response)
}

fn parse_pitch(response: &str) -> Result<PitchDraft, ApiError> {
    let draft: PitchDraft = serde_json::from_str(response)
        .map_err(|err| upstream(format!("unexpected model output: {}", err)))?;
    if draft.subject.trim().is_empty() || draft.body.trim().is_empty() {
        return Err(upstream("model returned an empty subject or body"));
    }
    Ok(draft)
}

/// Generate alternative subject lines for an email.
pub async fn generate_subject_lines(
    ai: &dyn Ai,
    subject: &str,
    body: &str,
    count: usize,
) -> Result<Vec<String>, ApiError> {
    let count = count.clamp(1, 10);
    let response = ai
        .complete_json(&subject_lines_prompt(subject, body, count))
        .await
        .map_err(upstream)?;
    parse_subject_lines(&response, count)
}

fn parse_subject_lines(response: &str, count: usize) -> Result<Vec<String>, ApiError> {
    let mut lines: Vec<String> = serde_json::from_str(response)
        .map_err(|err| upstream(format!("unexpected model output: {}", err)))?;
    lines.retain(|line| !line.trim().is_empty());
    if lines.is_empty() {
        return Err(upstream("model returned no subject lines"));
    }
    lines.truncate(count);
    Ok(lines)
}

/// Rewrite a draft body following the given instructions.
pub async fn improve_draft(
    ai: &dyn Ai,
    body: &str,
    instructions: &str,
) -> Result<String, ApiError> {
    let response = ai
        .complete(&improve_prompt(body, instructions))
        .await
        .map_err(upstream)?;
    let rewritten = response.trim();
    if rewritten.is_empty() {
        return Err(upstream("model returned an empty rewrite"));
    }
    Ok(rewritten.to_string())
}
