//! Wire representation of the service entity.

use mcpcat_core::mcp::{form_schema_for, form_schemas};
use mcpcat_core::prelude::*;
use serde_json::json;

#[test]
fn entity_round_trip_keeps_absent_fields_absent() {
    let wire = json!({
        "id": "6f8a1c2e-9b4d-4f3a-8e21-0c5d7a9b1f34",
        "name": "filesystem",
        "fullyQualifiedName": "filesystem",
        "serviceType": "Mcp",
        "connection": {
            "config": {
                "type": "Mcp",
                "config": {
                    "command": "node",
                    "args": ["mcp-server.js"],
                    "env": {"NODE_ENV": "development"}
                }
            }
        },
        "availableTools": [
            {"name": "read_file", "inputSchema": {"type": "object"}}
        ],
        "tags": [{
            "tagFQN": "PII.Sensitive",
            "labelType": "Manual",
            "source": "Classification",
            "state": "Confirmed"
        }],
        "deleted": false,
        "version": 1.1,
        "updatedAt": 1700000000000i64,
        "updatedBy": "admin"
    });

    let entity: McpService = serde_json::from_value(wire.clone()).unwrap();
    assert_eq!(entity.version, EntityVersion::from_tenths(11));
    assert!(entity.description.is_none());
    assert!(entity.available_resources.is_none());

    let back = serde_json::to_value(&entity).unwrap();
    assert_eq!(back, wire);
    let object = back.as_object().unwrap();
    assert!(!object.contains_key("description"));
    assert!(!object.contains_key("followers"));
}

#[test]
fn entity_without_deleted_flag_round_trips_without_it() {
    let wire = json!({
        "id": "0b7e2d4c-1a3f-4c5e-9d6b-8f1a2c3e4d5f",
        "name": "time",
        "fullyQualifiedName": "time",
        "serviceType": "Mcp",
        "version": 0.1,
        "updatedAt": 1700000000000i64,
        "updatedBy": "admin"
    });

    let entity: McpService = serde_json::from_value(wire.clone()).unwrap();
    assert!(!entity.is_deleted());

    let back = serde_json::to_value(&entity).unwrap();
    assert!(!back.as_object().unwrap().contains_key("deleted"));
    assert_eq!(back, wire);
}

#[test]
fn create_request_from_json() {
    let request: CreateMcpService = serde_json::from_value(json!({
        "name": "github",
        "serviceType": "Mcp",
        "connection": {"config": {"config": {"command": "npx", "args": ["-y", "server-github"]}}},
        "availableResources": [{"uri": "repo://issues", "mimeType": "application/json"}]
    }))
    .unwrap();
    assert!(request.validate(DuplicatePolicy::Warn).is_ok());
    assert_eq!(request.available_resources.as_ref().unwrap()[0].uri, "repo://issues");
}

#[test]
fn patch_distinguishes_null_from_absent() {
    let patch: McpServicePatch =
        serde_json::from_value(json!({"description": null, "displayName": "Files"})).unwrap();
    assert_eq!(patch.description, FieldPatch::Clear);
    assert_eq!(patch.display_name, FieldPatch::Set("Files".to_string()));
    assert_eq!(patch.server_instructions, FieldPatch::Keep);
}

#[test]
fn form_schemas_cover_every_type() {
    let schemas = form_schemas();
    assert_eq!(schemas.len(), McpType::ALL.len());

    let wire = serde_json::to_value(form_schema_for("Mcp").unwrap()).unwrap();
    assert!(wire.get("schema").is_some());
    assert!(wire.get("uiSchema").is_some());
    assert!(form_schema_for("Kafka").is_none());
}
