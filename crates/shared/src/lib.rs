use serde::{Deserialize, Serialize};

/// Extensions accepted by asset intake (compared lower-cased)
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["glb", "gltf"];

/// Why an upload was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    #[serde(rename = "invalid extension")]
    InvalidExtension,
    #[serde(rename = "unsafe filename")]
    UnsafeFilename,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidExtension => "invalid extension",
            RejectReason::UnsafeFilename => "unsafe filename",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an upload submission, as returned to the upload UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// Asset written; `url` is where the renderer fetches it from
    Stored { filename: String, url: String },
    Rejected { reason: RejectReason },
}

impl IntakeOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, IntakeOutcome::Stored { .. })
    }

    /// Public URL of a stored asset
    pub fn url(&self) -> Option<&str> {
        match self {
            IntakeOutcome::Stored { url, .. } => Some(url),
            IntakeOutcome::Rejected { .. } => None,
        }
    }
}

/// A stored asset as listed by the host API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssetList {
    pub assets: Vec<AssetEntry>,
}

/// Message posted from an embedded scene to its host page.
///
/// Serialized as `{"kind": "selection", "objectId": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneMessage {
    /// An object inside the scene was clicked
    Selection {
        #[serde(rename = "objectId")]
        object_id: String,
    },
}

impl SceneMessage {
    pub fn selection(object_id: impl Into<String>) -> Self {
        SceneMessage::Selection {
            object_id: object_id.into(),
        }
    }

    pub fn object_id(&self) -> &str {
        match self {
            SceneMessage::Selection { object_id } => object_id,
        }
    }
}

/// How many subscribers a published message reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub delivered: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stored_outcome_shape() {
        let outcome = IntakeOutcome::Stored {
            filename: "model.glb".into(),
            url: "http://localhost:8000/uploads/model.glb".into(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "stored");
        assert_eq!(value["url"], "http://localhost:8000/uploads/model.glb");
        assert_eq!(outcome.url(), Some("http://localhost:8000/uploads/model.glb"));
    }

    #[test]
    fn test_rejected_outcome_shape() {
        let outcome = IntakeOutcome::Rejected {
            reason: RejectReason::InvalidExtension,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({ "status": "rejected", "reason": "invalid extension" }));
        assert!(!outcome.is_stored());
        assert_eq!(outcome.url(), None);
    }

    #[test]
    fn test_selection_message_schema() {
        let msg = SceneMessage::selection("box");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({ "kind": "selection", "objectId": "box" }));

        let parsed: SceneMessage =
            serde_json::from_str(r#"{"kind":"selection","objectId":"sphere"}"#).unwrap();
        assert_eq!(parsed.object_id(), "sphere");
    }

    #[test]
    fn test_unknown_message_kind_rejected() {
        let parsed = serde_json::from_str::<SceneMessage>(r#"{"kind":"hover","objectId":"box"}"#);
        assert!(parsed.is_err());
    }
}
