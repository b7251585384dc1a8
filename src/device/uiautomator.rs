use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::trace;

use crate::device::{Device, DeviceError, adb::Adb};
use crate::graph::screen_model::{ElementAttributes, ElementSignature};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9008;

// ============================================================================
// Selector encoding
// ============================================================================

/// Selector fields understood by the uiautomator server, with the bit each
/// one sets in the selector mask.
const SELECTOR_FIELDS: &[(&str, u32)] = &[
    ("text", 0x01),
    ("textContains", 0x02),
    ("textMatches", 0x04),
    ("textStartsWith", 0x08),
    ("className", 0x10),
    ("classNameMatches", 0x20),
    ("description", 0x40),
    ("descriptionContains", 0x80),
    ("descriptionMatches", 0x0100),
    ("descriptionStartsWith", 0x0200),
    ("checkable", 0x0400),
    ("checked", 0x0800),
    ("clickable", 0x1000),
    ("longClickable", 0x2000),
    ("scrollable", 0x4000),
    ("enabled", 0x8000),
    ("focusable", 0x01_0000),
    ("focused", 0x02_0000),
    ("selected", 0x04_0000),
    ("packageName", 0x08_0000),
    ("packageNameMatches", 0x10_0000),
    ("resourceId", 0x20_0000),
    ("resourceIdMatches", 0x40_0000),
    ("index", 0x80_0000),
    ("instance", 0x0100_0000),
];

const INSTANCE_BIT: u32 = 0x0100_0000;

const BOOLEAN_FIELDS: &[&str] = &[
    "checkable",
    "checked",
    "clickable",
    "longClickable",
    "scrollable",
    "enabled",
    "focusable",
    "focused",
    "selected",
];

/// Selector field, mask bit and JSON value for one signature attribute, or
/// `None` if the selector cannot express it (unknown field, or an `index` /
/// `instance` that is not a number).
fn encode_field(name: &str, value: &str) -> Option<(u32, Value)> {
    let &(_, bit) = SELECTOR_FIELDS.iter().find(|(field, _)| *field == name)?;
    let encoded = if BOOLEAN_FIELDS.contains(&name) {
        Value::Bool(value.eq_ignore_ascii_case("true"))
    } else if matches!(name, "index" | "instance") {
        Value::from(value.parse::<u64>().ok()?)
    } else {
        Value::String(value.to_string())
    };
    Some((bit, encoded))
}

/// Encode a signature as a uiautomator selector object.
///
/// Attributes the selector cannot express are dropped here and checked
/// against `objInfo` instead.
pub fn selector_for(signature: &ElementSignature) -> Value {
    let mut selector = Map::new();
    let mut mask = 0u32;

    for (name, value) in signature.attributes() {
        if let Some((bit, encoded)) = encode_field(name, value) {
            selector.insert(name.clone(), encoded);
            mask |= bit;
        }
    }

    selector.insert("mask".into(), Value::from(mask));
    selector.insert("childOrSibling".into(), Value::Array(Vec::new()));
    selector.insert("childOrSiblingSelector".into(), Value::Array(Vec::new()));
    Value::Object(selector)
}

/// Narrow `selector` to the `instance`-th element it matches.
pub fn with_instance(selector: &Value, instance: u64) -> Value {
    let mut narrowed = selector.clone();
    if let Some(object) = narrowed.as_object_mut() {
        let mask = object.get("mask").and_then(Value::as_u64).unwrap_or(0);
        object.insert("instance".into(), Value::from(instance));
        object.insert("mask".into(), Value::from(mask | u64::from(INSTANCE_BIT)));
    }
    narrowed
}

/// Flatten an `objInfo` result into string attributes, using the same
/// names as selectors so signatures can be compared against them.
pub fn attributes_from_info(info: &Value) -> ElementAttributes {
    let mut attributes = ElementAttributes::new();
    let Some(object) = info.as_object() else {
        return attributes;
    };

    for (key, value) in object {
        let name = match key.as_str() {
            "contentDescription" => "description",
            "resourceName" => "resourceId",
            other => other,
        };
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        attributes.insert(name.to_string(), text);
    }
    attributes
}

/// Attributes of `signature` that `selector_for` had to drop.
fn residual_attributes(signature: &ElementSignature) -> impl Iterator<Item = (&String, &String)> {
    signature
        .attributes()
        .iter()
        .filter(|(name, value)| encode_field(name, value).is_none())
}

/// Check the attributes of `signature` that `selector_for` had to drop.
pub fn residual_matches(signature: &ElementSignature, attributes: &ElementAttributes) -> bool {
    residual_attributes(signature).all(|(name, expected)| attributes.get(name) == Some(expected))
}

/// Walk the `count` elements a selector matches, in instance order, and
/// return the first whose `objInfo` passes the residual check.
pub fn first_residual_match<F>(
    signature: &ElementSignature,
    count: u64,
    mut info_at: F,
) -> Result<Option<ElementAttributes>, DeviceError>
where
    F: FnMut(u64) -> Result<Value, DeviceError>,
{
    for instance in 0..count {
        let attributes = attributes_from_info(&info_at(instance)?);
        if residual_matches(signature, &attributes) {
            return Ok(Some(attributes));
        }
    }
    Ok(None)
}

// ============================================================================
// JSON-RPC envelope
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// UiAutomatorDevice
// ============================================================================

/// Android device driven through the uiautomator JSON-RPC server that runs
/// on the phone (forwarded to `host:port` by adb).
pub struct UiAutomatorDevice {
    endpoint: String,
    client: reqwest::blocking::Client,
    adb: Adb,
    next_id: u64,
}

impl UiAutomatorDevice {
    pub fn new(host: &str, port: u16, serial: Option<&str>) -> Self {
        Self {
            endpoint: format!("http://{}:{}/jsonrpc/0", host, port),
            client: reqwest::blocking::Client::new(),
            adb: Adb::new(serial),
            next_id: 1,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call one JSON-RPC method and return its result.
    fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, DeviceError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id,
            method,
            params,
        };
        self.next_id += 1;
        trace!(method, id = request.id, "jsonrpc call");

        let response: RpcResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|source| DeviceError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if let Some(error) = response.error {
            return Err(DeviceError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    fn call_bool(&mut self, method: &str, params: Vec<Value>) -> Result<bool, DeviceError> {
        let result = self.call(method, params)?;
        result.as_bool().ok_or_else(|| DeviceError::Protocol {
            method: method.to_string(),
            detail: format!("expected a boolean, got {}", result),
        })
    }
}

impl Device for UiAutomatorDevice {
    fn query(&mut self, signature: &ElementSignature) -> Result<Option<ElementAttributes>, DeviceError> {
        let selector = selector_for(signature);
        let pinned = signature.attributes().contains_key("instance");

        if pinned || residual_attributes(signature).next().is_none() {
            if !self.call_bool("exist", vec![selector.clone()])? {
                return Ok(None);
            }
            let attributes = attributes_from_info(&self.call("objInfo", vec![selector])?);
            return Ok(residual_matches(signature, &attributes).then_some(attributes));
        }

        // Several elements may pass the selector; only some may carry the
        // residual attributes.
        let count = self.call("count", vec![selector.clone()])?;
        let count = count.as_u64().ok_or_else(|| DeviceError::Protocol {
            method: "count".into(),
            detail: format!("expected a number, got {}", count),
        })?;
        first_residual_match(signature, count, |instance| {
            self.call("objInfo", vec![with_instance(&selector, instance)])
        })
    }

    fn click(&mut self, signature: &ElementSignature) -> Result<(), DeviceError> {
        if self.call_bool("click", vec![selector_for(signature)])? {
            Ok(())
        } else {
            Err(DeviceError::ElementNotFound(signature.clone()))
        }
    }

    fn send_text(&mut self, signature: &ElementSignature, text: &str) -> Result<(), DeviceError> {
        if self.call_bool("setText", vec![selector_for(signature), json!(text)])? {
            Ok(())
        } else {
            Err(DeviceError::ElementNotFound(signature.clone()))
        }
    }

    fn launch(&mut self, app_name: &str) -> Result<(), DeviceError> {
        self.adb.launch(app_name)
    }

    fn dump_hierarchy(&mut self) -> Result<String, DeviceError> {
        let result = self.call("dumpWindowHierarchy", vec![json!(false), Value::Null])?;
        match result {
            Value::String(xml) => Ok(xml),
            other => Err(DeviceError::Protocol {
                method: "dumpWindowHierarchy".into(),
                detail: format!("expected an XML string, got {}", other),
            }),
        }
    }
}
