use serde::{Deserialize, Serialize};

/// Picture payload for the picture PUT endpoints: base64 text or a data
/// URL, normalized to raw bytes by the service before storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub data: String,
}
