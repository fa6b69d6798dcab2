//! A small CRM site: lead and deal schemas, saved views, users, site
//! settings and integration flags.

use serde_json::{Value, json};

pub use crm_client::api::{
    CALL_INTEGRATION_ENABLED, GET_DEFAULT_OPEN_VIEW, GET_DOC, GET_DOCTYPE, GET_USERS, GET_VIEWS,
    LEGACY_TWILIO_ENABLED, SAVE_USER_SETTINGS, WHATSAPP_ENABLED, WHATSAPP_INSTALLED,
};

pub const METHODS: [&str; 10] = [
    GET_DOCTYPE,
    GET_DOC,
    SAVE_USER_SETTINGS,
    GET_VIEWS,
    GET_DEFAULT_OPEN_VIEW,
    GET_USERS,
    WHATSAPP_ENABLED,
    WHATSAPP_INSTALLED,
    CALL_INTEGRATION_ENABLED,
    LEGACY_TWILIO_ENABLED,
];

/// Reply for `method`, `None` for methods the site does not have.
pub fn fixture(method: &str) -> Option<Value> {
    Some(match method {
        GET_DOCTYPE => lead_schema(),
        GET_DOC => crm_settings(),
        SAVE_USER_SETTINGS => Value::Null,
        GET_VIEWS => views(),
        GET_DEFAULT_OPEN_VIEW => default_open_views(),
        GET_USERS => users(),
        WHATSAPP_ENABLED => json!(true),
        WHATSAPP_INSTALLED => json!(1),
        CALL_INTEGRATION_ENABLED => json!({
            "twilio_enabled": true,
            "exotel_enabled": false,
            "default_calling_medium": "twilio"
        }),
        LEGACY_TWILIO_ENABLED => json!(true),
        _ => return None,
    })
}

/// The `FCRM Settings` singleton, the only document the site serves.
pub fn crm_settings() -> Value {
    json!({
        "name": "FCRM Settings",
        "doctype": "FCRM Settings",
        "brand_name": "Acme CRM",
        "brand_logo": "/files/acme-logo.svg",
        "favicon": null,
        "restore_defaults": 0
    })
}

/// `getdoctype` for `CRM Lead` with its `CRM Products` child table.
pub fn lead_schema() -> Value {
    json!({
        "docs": [
            {
                "name": "CRM Lead",
                "title_field": "lead_name",
                "fields": [
                    { "fieldname": "lead_name", "fieldtype": "Data", "label": "Lead Name", "in_list_view": 1 },
                    {
                        "fieldname": "status",
                        "fieldtype": "Select",
                        "label": "Status",
                        "options": "New\nContacted\nNurture\nQualified\nUnqualified\nJunk"
                    },
                    { "fieldname": "lead_owner", "fieldtype": "Link", "label": "Lead Owner", "options": "User" },
                    { "fieldname": "organization", "fieldtype": "Link", "options": "CRM Organization" },
                    { "fieldname": "currency", "fieldtype": "Link", "options": "Currency" },
                    {
                        "fieldname": "annual_revenue",
                        "fieldtype": "Currency",
                        "label": "Annual Revenue",
                        "options": "currency",
                        "precision": ""
                    },
                    {
                        "fieldname": "org_revenue",
                        "fieldtype": "Currency",
                        "options": "CRM Organization:currency",
                        "precision": "0"
                    },
                    { "fieldname": "probability", "fieldtype": "Percent", "precision": 1 },
                    {
                        "fieldname": "lost_reason",
                        "fieldtype": "Small Text",
                        "depends_on": "eval:doc.status == 'Unqualified'"
                    },
                    { "fieldname": "products", "fieldtype": "Table", "options": "CRM Products" }
                ]
            },
            {
                "name": "CRM Products",
                "istable": 1,
                "fields": [
                    { "fieldname": "product_code", "fieldtype": "Link", "options": "Item" },
                    { "fieldname": "qty", "fieldtype": "Float", "precision": "3" },
                    { "fieldname": "rate", "fieldtype": "Currency", "options": "currency" }
                ]
            }
        ],
        "user_settings": "{\"GridView\": {\"CRM Products\": {\"qty\": {\"width\": 80}}}}"
    })
}

pub fn views() -> Value {
    json!([
        {
            "name": "VIEW-0001",
            "label": "My Open Leads",
            "dt": "CRM Lead",
            "type": "list",
            "pinned": 1,
            "filters": "{\"status\": \"Open\"}"
        },
        {
            "name": "VIEW-0002",
            "label": "Team Pipeline",
            "dt": "CRM Deal",
            "type": "kanban",
            "public": 1,
            "icon": "🔥",
            "column_field": "status"
        },
        {
            "name": "VIEW-0003",
            "dt": "CRM Lead",
            "type": "kanban",
            "is_standard": 1
        },
        {
            "name": "VIEW-0004",
            "label": "By Owner",
            "dt": "CRM Lead",
            "type": "group_by",
            "group": 1,
            "pinned": 1,
            "public": 1,
            "group_by_field": "lead_owner"
        },
        {
            "name": "VIEW-0005",
            "dt": "CRM Deal",
            "type": null,
            "is_default": 1
        }
    ])
}

pub fn default_open_views() -> Value {
    json!({ "CRM Lead": "kanban", "CRM Deal": "list" })
}

/// `[all_users, crm_users]`.
pub fn users() -> Value {
    json!([
        [
            {
                "name": "Administrator",
                "email": "admin@example.com",
                "full_name": "Administrator",
                "role": "System Manager"
            },
            {
                "name": "jane@example.com",
                "email": "jane@example.com",
                "full_name": "Jane Doe",
                "first_name": "Jane",
                "last_name": "Doe",
                "role": "Sales Manager",
                "is_telephony_agent": 1
            },
            {
                "name": "raj@example.com",
                "email": "raj@example.com",
                "full_name": "Raj Patel",
                "first_name": "Raj",
                "role": "Sales User"
            }
        ],
        ["jane@example.com", "raj@example.com"]
    ])
}
