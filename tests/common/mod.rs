#![allow(dead_code)]

use std::time::Duration;

use apk_controller::device::{Device, DeviceError};
use apk_controller::graph::screen_model::{ElementAttributes, ElementSignature};

/// Attributes of one fake on-screen element.
pub fn element(pairs: &[(&str, &str)]) -> ElementAttributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Elements visible on one fake screen.
pub type Frame = Vec<ElementAttributes>;

pub fn frame_with_texts(texts: &[&str]) -> Frame {
    texts.iter().map(|t| element(&[("text", t)])).collect()
}

/// Scripted device: shows `frames` one after another. Every successful
/// click moves to the next frame. After each frame change the first
/// `render_delay` queries see nothing, imitating slow rendering.
pub struct FakeDevice {
    frames: Vec<Frame>,
    current: usize,
    render_delay: u32,
    pending_delay: u32,
    pub queries: usize,
    pub clicks: Vec<ElementSignature>,
    pub texts: Vec<(ElementSignature, String)>,
    pub launched: Vec<String>,
    pub dumps: usize,
    pub fail_launch: bool,
}

impl FakeDevice {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            current: 0,
            render_delay: 0,
            pending_delay: 0,
            queries: 0,
            clicks: Vec::new(),
            texts: Vec::new(),
            launched: Vec::new(),
            dumps: 0,
            fail_launch: false,
        }
    }

    /// Hide every new frame for `queries` queries.
    pub fn with_render_delay(mut self, queries: u32) -> Self {
        self.render_delay = queries;
        self.pending_delay = queries;
        self
    }

    /// Number of interactions (clicks, text input, launches).
    pub fn interactions(&self) -> usize {
        self.clicks.len() + self.texts.len() + self.launched.len()
    }

    fn visible(&self) -> &[ElementAttributes] {
        self.frames
            .get(self.current)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn find(&self, signature: &ElementSignature) -> Option<ElementAttributes> {
        self.visible()
            .iter()
            .find(|el| signature.matches(el))
            .cloned()
    }
}

impl Device for FakeDevice {
    fn query(&mut self, signature: &ElementSignature) -> Result<Option<ElementAttributes>, DeviceError> {
        self.queries += 1;
        if self.pending_delay > 0 {
            self.pending_delay -= 1;
            return Ok(None);
        }
        Ok(self.find(signature))
    }

    fn click(&mut self, signature: &ElementSignature) -> Result<(), DeviceError> {
        if self.find(signature).is_none() {
            return Err(DeviceError::ElementNotFound(signature.clone()));
        }
        self.clicks.push(signature.clone());
        self.current += 1;
        self.pending_delay = self.render_delay;
        Ok(())
    }

    fn send_text(&mut self, signature: &ElementSignature, text: &str) -> Result<(), DeviceError> {
        if self.find(signature).is_none() {
            return Err(DeviceError::ElementNotFound(signature.clone()));
        }
        self.texts.push((signature.clone(), text.to_string()));
        Ok(())
    }

    fn launch(&mut self, app_name: &str) -> Result<(), DeviceError> {
        if self.fail_launch {
            return Err(DeviceError::Protocol {
                method: "launch".into(),
                detail: "device offline".into(),
            });
        }
        self.launched.push(app_name.to_string());
        Ok(())
    }

    fn dump_hierarchy(&mut self) -> Result<String, DeviceError> {
        self.dumps += 1;
        let nodes: Vec<String> = self
            .visible()
            .iter()
            .map(|el| {
                let attrs: Vec<String> = el.iter().map(|(k, v)| format!("{}=\"{}\"", k, v)).collect();
                format!("<node {} />", attrs.join(" "))
            })
            .collect();
        Ok(format!("<hierarchy>{}</hierarchy>", nodes.join("")))
    }
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
