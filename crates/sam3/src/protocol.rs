//! Line-delimited JSON exchanged with the worker over stdin/stdout.
//!
//! The worker announces itself with `{"status":"ready"}`, then answers each
//! request line with exactly one `ok` or `error` line.

use std::path::PathBuf;

use mask::RawMask;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerRequest {
    /// PNG of the image to segment, removed after the response arrives
    pub image_path: PathBuf,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerMessage {
    Ready {
        #[serde(default)]
        model: Option<String>,
    },
    Ok {
        masks: Vec<RawMask>,
        #[serde(default)]
        scores: Vec<f32>,
    },
    Error {
        message: String,
    },
}

/// JSON schema of both directions of the protocol
pub fn protocol_schema() -> serde_json::Value {
    serde_json::json!({
        "request": schemars::schema_for!(WorkerRequest),
        "message": schemars::schema_for!(WorkerMessage),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        let ready: WorkerMessage = serde_json::from_str(r#"{"status":"ready"}"#).unwrap();
        assert_eq!(ready, WorkerMessage::Ready { model: None });

        let ok: WorkerMessage = serde_json::from_str(
            r#"{"status":"ok","masks":[{"shape":[1,1,2],"data":[0.5,0.0]}],"scores":[0.8]}"#,
        )
        .unwrap();
        match ok {
            WorkerMessage::Ok { masks, scores } => {
                assert_eq!(masks[0].shape, vec![1, 1, 2]);
                assert_eq!(scores, vec![0.8]);
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let err: WorkerMessage =
            serde_json::from_str(r#"{"status":"error","message":"CUDA out of memory"}"#).unwrap();
        assert_eq!(
            err,
            WorkerMessage::Error {
                message: "CUDA out of memory".to_string()
            }
        );
    }

    #[test]
    fn test_request_line_is_single_line() {
        let request = WorkerRequest {
            image_path: PathBuf::from("/tmp/x.png"),
            prompt: "red\ntruck".to_string(),
        };
        let line = serde_json::to_string(&request).unwrap();
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_schema_mentions_status_values() {
        let schema = protocol_schema().to_string();
        assert!(schema.contains("ready"));
        assert!(schema.contains("image_path"));
    }
}
