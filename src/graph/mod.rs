pub mod screen_model;
pub mod script_graph;
pub mod selection;
