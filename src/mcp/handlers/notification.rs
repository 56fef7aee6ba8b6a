//! `notification` namespace: push messages into the SiYuan UI.

use serde_json::json;

use crate::mcp::client::create_handler;
use crate::mcp::descriptor::{CommandDescriptor, Documentation, Example, McpMode, ReturnShape};
use crate::mcp::error::CommandError;
use crate::mcp::registry::Registry;
use crate::mcp::schema::{ParamSchema, ParamType};

const NAMESPACE: &str = "notification";
const API_DOC: &str = "https://github.com/siyuan-note/siyuan/blob/master/API.md";

/// Both notification commands take the same parameters.
fn message_params(msg_description: &str) -> ParamSchema {
    ParamSchema::empty()
        .required("msg", ParamType::String, msg_description)
        .optional(
            "timeout",
            ParamType::Number,
            "Message display duration in milliseconds",
        )
}

fn push_msg() -> CommandDescriptor {
    CommandDescriptor {
        namespace: NAMESPACE.into(),
        name: "pushMsg".into(),
        description: "Push a message notification".into(),
        params: message_params("Message content"),
        modes: vec![McpMode::Write],
        handler: create_handler("/api/notification/pushMsg"),
        documentation: Documentation {
            returns: ReturnShape::object("Operation result", &[]),
            examples: vec![Example {
                description: "This example shows how to display a temporary notification message to the user for 7 seconds, useful for showing operation success or status updates.".into(),
                params: json!({ "msg": "Hello World", "timeout": 7000 }),
                response: json!({}),
            }],
            api_link: format!("{}#push-message", API_DOC),
        },
    }
}

fn push_err_msg() -> CommandDescriptor {
    CommandDescriptor {
        namespace: NAMESPACE.into(),
        name: "pushErrMsg".into(),
        description: "Push an error message notification".into(),
        params: message_params("Error message content"),
        modes: vec![McpMode::Write],
        handler: create_handler("/api/notification/pushErrMsg"),
        documentation: Documentation {
            returns: ReturnShape::object("Operation result", &[]),
            examples: vec![Example {
                description: "This example demonstrates displaying an error notification that persists for 7 seconds, highlighting a failed operation or system issue to the user.".into(),
                params: json!({ "msg": "Operation failed", "timeout": 7000 }),
                response: json!({}),
            }],
            api_link: format!("{}#push-error-message", API_DOC),
        },
    }
}

pub fn register(registry: &mut Registry) -> Result<(), CommandError> {
    registry.register_command(push_msg())?;
    registry.register_command(push_err_msg())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mcp::client::testing::RecordingTransport;
    use crate::mcp::descriptor::RequestKind;
    use crate::mcp::dispatch::{AccessPolicy, Dispatcher};

    fn dispatcher(transport: Arc<RecordingTransport>) -> Dispatcher {
        let mut registry = Registry::new();
        register(&mut registry).unwrap();
        Dispatcher::new(Arc::new(registry), transport, AccessPolicy::ReadWrite)
    }

    #[tokio::test]
    async fn test_push_msg_forwards_payload() {
        let transport = RecordingTransport::replying(Ok(json!({})));
        let result = dispatcher(transport.clone())
            .invoke(
                "notification",
                "pushMsg",
                &json!({ "msg": "Hello World", "timeout": 7000 }),
            )
            .await
            .unwrap();
        assert_eq!(result, json!({}));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/notification/pushMsg");
        assert_eq!(requests[0].kind, RequestKind::Write);
        assert_eq!(
            requests[0].params.to_value(),
            json!({ "msg": "Hello World", "timeout": 7000 })
        );
    }

    #[tokio::test]
    async fn test_push_err_msg_backend_error() {
        let transport = RecordingTransport::replying(Ok(json!({ "code": 1, "msg": "error" })));
        let err = dispatcher(transport.clone())
            .call_tool("notification_pushErrMsg", &json!({ "msg": "Operation failed" }))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::Backend {
                code: 1,
                msg: "error".into()
            }
        );
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].path, "/api/notification/pushErrMsg");
    }

    #[tokio::test]
    async fn test_push_msg_requires_msg() {
        let transport = RecordingTransport::replying(Ok(json!({})));
        let err = dispatcher(transport.clone())
            .invoke("notification", "pushMsg", &json!({ "timeout": 7000 }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_input_schema() {
        let schema = push_msg().params.to_json_schema();
        assert_eq!(schema["required"], json!(["msg"]));
        assert_eq!(
            schema["properties"]["timeout"]["description"],
            "Message display duration in milliseconds"
        );
    }
}
