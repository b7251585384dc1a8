pub mod adb;
pub mod uiautomator;

use thiserror::Error;

use crate::graph::screen_model::{ElementAttributes, ElementSignature};

// ============================================================================
// Device trait: the engine's only view of the phone
// ============================================================================

/// Query and interaction capability of one connected device.
///
/// The engine only needs "does an element matching X exist right now" and
/// "perform interaction Y". Each call is a blocking round trip.
pub trait Device {
    /// Attributes of the first displayed element that carries every
    /// attribute of `signature`, or `None` if there is no such element.
    fn query(&mut self, signature: &ElementSignature) -> Result<Option<ElementAttributes>, DeviceError>;

    fn click(&mut self, signature: &ElementSignature) -> Result<(), DeviceError>;

    fn send_text(&mut self, signature: &ElementSignature, text: &str) -> Result<(), DeviceError>;

    fn launch(&mut self, app_name: &str) -> Result<(), DeviceError>;

    /// Raw UI hierarchy of the current screen (uiautomator XML dump).
    fn dump_hierarchy(&mut self) -> Result<String, DeviceError>;
}

impl<D: Device + ?Sized> Device for &mut D {
    fn query(&mut self, signature: &ElementSignature) -> Result<Option<ElementAttributes>, DeviceError> {
        (**self).query(signature)
    }

    fn click(&mut self, signature: &ElementSignature) -> Result<(), DeviceError> {
        (**self).click(signature)
    }

    fn send_text(&mut self, signature: &ElementSignature, text: &str) -> Result<(), DeviceError> {
        (**self).send_text(signature, text)
    }

    fn launch(&mut self, app_name: &str) -> Result<(), DeviceError> {
        (**self).launch(app_name)
    }

    fn dump_hierarchy(&mut self) -> Result<String, DeviceError> {
        (**self).dump_hierarchy()
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    /// HTTP transport to the on-device server failed
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a JSON-RPC error object
    #[error("{method} failed with JSON-RPC error {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// The server answered with something that is not the expected shape
    #[error("unexpected response to {method}: {detail}")]
    Protocol { method: String, detail: String },

    #[error("failed to spawn {program} (is it on PATH?): {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// An interaction targeted an element that is not on screen
    #[error("no element matching {0} to interact with")]
    ElementNotFound(ElementSignature),
}
