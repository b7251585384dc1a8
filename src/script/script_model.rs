use crate::graph::script_graph::{GraphError, ScriptGraph};

/// A complete script: the app it drives and the screen graph to follow.
///
/// Immutable once built; one script can drive any number of runs.
#[derive(Debug)]
pub struct Script {
    /// Package name as known to the device, e.g. `org.torproject.android`
    pub app_name: String,

    /// App version the script was written against
    pub version: String,

    pub graph: ScriptGraph,
}

impl Script {
    /// Wrap a graph, validating its topology first.
    pub fn new(app_name: &str, version: &str, graph: ScriptGraph) -> Result<Self, GraphError> {
        graph.validate()?;
        Ok(Self {
            app_name: app_name.to_string(),
            version: version.to_string(),
            graph,
        })
    }
}
