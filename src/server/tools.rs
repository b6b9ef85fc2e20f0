//! The `qr_code_read` tool: descriptor, argument handling, response text.
//!
//! [`ToolGateway::call_tool`] distinguishes two outcomes:
//! - `Err(GatewayError)`: the request could not be dispatched at all
//!   (unknown tool, malformed arguments). The transport turns this into a
//!   JSON-RPC error.
//! - `Ok(CallToolResult)`: the tool ran. Failures to read a QR code are
//!   ordinary results with `is_error` set and a single text line.
//!
//! Argument types are checked before the tool runs: a non-string
//! `image_path` or `image_data` (say `42`) is `GatewayError::InvalidParams`,
//! so the client sees a JSON-RPC `-32602` error rather than an
//! `Error reading QR code: ...` text result. `null` counts as absent.

use crate::config::ReaderConfig;
use crate::error::GatewayError;
use crate::pipeline::detect::{QrDetector, RqrrDetector};
use crate::read::{read_qr_using, reference_from_args, MISSING_INPUT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info};

pub const TOOL_NAME: &str = "qr_code_read";
pub const TOOL_DESCRIPTION: &str = "Read and decode QR codes from images";

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// One item of tool output. Only text is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Content::Text { text } => text,
        }
    }
}

/// The result of a dispatched tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<Content>,
    pub is_error: bool,
}

impl CallToolResult {
    fn ok(text: String) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
        }
    }

    fn err(text: String) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: true,
        }
    }

    /// Text of the single content item.
    pub fn text(&self) -> &str {
        self.content.first().map(Content::as_text).unwrap_or("")
    }
}

/// Arguments accepted by `qr_code_read`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadArgs {
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Dispatches tool calls to the QR reader.
#[derive(Clone)]
pub struct ToolGateway {
    config: ReaderConfig,
    detector: Arc<dyn QrDetector>,
}

impl Default for ToolGateway {
    fn default() -> Self {
        Self::new(ReaderConfig::default())
    }
}

impl std::fmt::Debug for ToolGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGateway")
            .field("config", &self.config)
            .field("detector", &"<dyn QrDetector>")
            .finish()
    }
}

impl ToolGateway {
    pub fn new(config: ReaderConfig) -> Self {
        Self::with_detector(config, Arc::new(RqrrDetector::new()))
    }

    pub fn with_detector(config: ReaderConfig, detector: Arc<dyn QrDetector>) -> Self {
        Self { config, detector }
    }

    /// Every tool this gateway offers.
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            input_schema: input_schema(),
        }]
    }

    /// Run the named tool.
    ///
    /// `arguments` may be `null` (treated as an empty object).
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
    ) -> Result<CallToolResult, GatewayError> {
        if name != TOOL_NAME {
            return Err(GatewayError::UnknownTool {
                name: name.to_string(),
            });
        }

        let args = parse_args(arguments)?;
        let image_path = args.image_path.as_deref().filter(|s| !s.is_empty());
        let image_data = args.image_data.as_deref().filter(|s| !s.is_empty());

        if image_path.is_none() && image_data.is_none() {
            return Ok(CallToolResult::err(format!("Error: {MISSING_INPUT}")));
        }

        let outcome = match reference_from_args(image_path, image_data) {
            Ok(reference) => {
                read_qr_using(reference, &self.config, Arc::clone(&self.detector)).await
            }
            Err(e) => Err(e),
        };

        Ok(match outcome {
            Ok(payload) => {
                info!("{}: decoded {} chars", TOOL_NAME, payload.chars().count());
                CallToolResult::ok(format!("QR Code decoded successfully: {payload}"))
            }
            Err(e) => {
                error!("Error reading QR code: {}", e);
                CallToolResult::err(format!("Error reading QR code: {e}"))
            }
        })
    }
}

fn parse_args(arguments: &Value) -> Result<ReadArgs, GatewayError> {
    let invalid = |detail: String| GatewayError::InvalidParams {
        tool: TOOL_NAME.to_string(),
        detail,
    };

    match arguments {
        Value::Null => Ok(ReadArgs::default()),
        Value::Object(map) => {
            // Explicit nulls are the same as missing fields.
            let map: Map<String, Value> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            serde_json::from_value(Value::Object(map)).map_err(|e| invalid(e.to_string()))
        }
        other => Err(invalid(format!("expected an object, got {other}"))),
    }
}

/// JSON schema for `qr_code_read`: exactly one of the two string fields.
fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "image_path": {
                "type": "string",
                "description": "Path to the image file containing QR code"
            },
            "image_data": {
                "type": "string",
                "description": "Base64 encoded image data (alternative to image_path)"
            }
        },
        "oneOf": [
            {"required": ["image_path"]},
            {"required": ["image_data"]}
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::detect::{DetectorError, Frame};

    struct Fixed(&'static str);

    impl QrDetector for Fixed {
        fn detect_multi(&self, _frame: Frame<'_>) -> Result<Vec<String>, DetectorError> {
            Ok(vec![self.0.to_string()])
        }

        fn detect_single(&self, _frame: Frame<'_>) -> Result<Option<String>, DetectorError> {
            Ok(Some(self.0.to_string()))
        }
    }

    fn gateway() -> ToolGateway {
        ToolGateway::default()
    }

    #[test]
    fn lists_exactly_one_tool() {
        let tools = gateway().list_tools();
        assert_eq!(tools.len(), 1);
        let tool = &tools[0];
        assert_eq!(tool.name, "qr_code_read");
        assert!(tool.description.contains("Read and decode QR codes from images"));

        let schema = &tool.input_schema;
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].get("image_path").is_some());
        assert!(schema["properties"].get("image_data").is_some());
        let one_of = schema["oneOf"].as_array().unwrap();
        assert!(one_of.contains(&json!({"required": ["image_path"]})));
        assert!(one_of.contains(&json!({"required": ["image_data"]})));
    }

    #[test]
    fn tool_serialises_with_camel_case_schema_key() {
        let v = serde_json::to_value(&gateway().list_tools()[0]).unwrap();
        assert!(v.get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn unknown_tool_is_a_hard_failure() {
        let err = gateway()
            .call_tool("unknown_tool", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::UnknownTool {
                name: "unknown_tool".into()
            }
        );
        assert_eq!(err.to_string(), "Unknown tool: unknown_tool");
    }

    #[tokio::test]
    async fn no_arguments_is_a_text_error() {
        for args in [json!({}), Value::Null, json!({"image_path": null, "image_data": ""})] {
            let result = gateway().call_tool(TOOL_NAME, &args).await.unwrap();
            assert!(result.is_error);
            assert_eq!(
                result.text(),
                "Error: Either image_path or image_data must be provided"
            );
        }
    }

    #[tokio::test]
    async fn non_string_argument_is_invalid_params() {
        let err = gateway()
            .call_tool(TOOL_NAME, &json!({"image_path": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParams { .. }));

        let err = gateway()
            .call_tool(TOOL_NAME, &json!(["a.png"]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_reported_as_text() {
        let result = gateway()
            .call_tool(TOOL_NAME, &json!({"image_path": "/nonexistent/path.png"}))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text().starts_with("Error reading QR code:"));
        assert!(result.text().contains("/nonexistent/path.png"));
    }

    #[tokio::test]
    async fn invalid_base64_is_reported_as_text() {
        let result = gateway()
            .call_tool(TOOL_NAME, &json!({"image_data": "invalid_base64_data"}))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text().starts_with("Error reading QR code:"));
    }

    #[tokio::test]
    async fn both_inputs_are_rejected() {
        let result = gateway()
            .call_tool(TOOL_NAME, &json!({"image_path": "a.png", "image_data": "AAAA"}))
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(
            result.text(),
            "Error reading QR code: Provide only one of image_path or image_data"
        );
    }

    #[tokio::test]
    async fn success_text_carries_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("any.png");
        image::RgbImage::new(4, 4).save(&path).unwrap();

        let gw = ToolGateway::with_detector(ReaderConfig::default(), Arc::new(Fixed("https://example.com")));
        let result = gw
            .call_tool(TOOL_NAME, &json!({"image_path": path.to_str().unwrap()}))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.text(), "QR Code decoded successfully: https://example.com");

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["content"][0]["type"], "text");
        assert_eq!(v["isError"], false);
    }
}
