//! Change stream resume tokens in their command-line form.
//!
//! A token is the BSON encoding of the stream's `_id`, base64-encoded so it
//! can be logged after each batch and passed back with `--resume-after`.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use mongodb::change_stream::event::ResumeToken;

pub fn encode_resume_token(token: &ResumeToken) -> Result<String> {
    let bytes = bson::to_vec(token)?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

pub fn decode_resume_token(encoded: &str) -> Result<ResumeToken> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        anyhow::bail!("Invalid resume token: token cannot be empty");
    }
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| anyhow!("Invalid base64 resume token: {e}"))?;
    // Starting from "now" instead would silently skip every change since the token.
    bson::from_slice::<ResumeToken>(&bytes).map_err(|e| {
        anyhow!(
            "Failed to decode resume token - refusing to start to prevent data loss: {e}. \
             The token may be corrupted or from an incompatible MongoDB version."
        )
    })
}
