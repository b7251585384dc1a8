pub mod dispatcher;
pub mod error;
pub mod history;
pub mod matcher;
pub mod runner;
