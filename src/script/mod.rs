pub mod builder;
pub mod definition;
pub mod script_model;
