//! `system` namespace: read-only kernel information.

use serde_json::json;

use crate::mcp::client::create_handler;
use crate::mcp::descriptor::{CommandDescriptor, Documentation, Example, McpMode, ReturnShape};
use crate::mcp::error::CommandError;
use crate::mcp::registry::Registry;
use crate::mcp::schema::ParamSchema;

const NAMESPACE: &str = "system";
const API_DOC: &str = "https://github.com/siyuan-note/siyuan/blob/master/API.md";

fn get_boot_progress() -> CommandDescriptor {
    CommandDescriptor {
        namespace: NAMESPACE.into(),
        name: "getBootProgress".into(),
        description: "Get boot progress".into(),
        params: ParamSchema::empty(),
        modes: vec![McpMode::Read],
        handler: create_handler("/api/system/getBootProgress"),
        documentation: Documentation {
            returns: ReturnShape::object(
                "Boot progress information",
                &[
                    ("progress", "Boot progress percentage"),
                    ("details", "Progress details"),
                ],
            ),
            examples: vec![Example {
                description: "This example retrieves the current boot progress status, showing both the percentage completed and detailed status information.".into(),
                params: json!({}),
                response: json!({ "progress": 100, "details": "Completed" }),
            }],
            api_link: format!("{}#get-boot-progress", API_DOC),
        },
    }
}

fn get_version() -> CommandDescriptor {
    CommandDescriptor {
        namespace: NAMESPACE.into(),
        name: "getVersion".into(),
        description: "Get system version".into(),
        params: ParamSchema::empty(),
        modes: vec![McpMode::Read],
        handler: create_handler("/api/system/version"),
        documentation: Documentation {
            returns: ReturnShape::object(
                "Version information",
                &[("version", "System version"), ("os", "Operating system")],
            ),
            examples: vec![Example {
                description: "This example retrieves the current system version and operating system information, useful for compatibility checking and system reporting.".into(),
                params: json!({}),
                response: json!({ "version": "2.8.8", "os": "windows" }),
            }],
            api_link: format!("{}#get-system-version", API_DOC),
        },
    }
}

fn get_current_time() -> CommandDescriptor {
    CommandDescriptor {
        namespace: NAMESPACE.into(),
        name: "getCurrentTime".into(),
        description: "Get current time".into(),
        params: ParamSchema::empty(),
        modes: vec![McpMode::Read],
        handler: create_handler("/api/system/currentTime"),
        documentation: Documentation {
            returns: ReturnShape::object(
                "Current time information",
                &[("time", "Current time in milliseconds")],
            ),
            examples: vec![Example {
                description: "This example gets the current system time in milliseconds since the Unix epoch, useful for timestamp generation and time synchronization.".into(),
                params: json!({}),
                response: json!({ "time": 1629158400000u64 }),
            }],
            api_link: format!("{}#get-the-current-time-of-the-system", API_DOC),
        },
    }
}

pub fn register(registry: &mut Registry) -> Result<(), CommandError> {
    registry.register_command(get_boot_progress())?;
    registry.register_command(get_version())?;
    registry.register_command(get_current_time())?;
    Ok(())
}
