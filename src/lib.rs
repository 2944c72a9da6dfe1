pub mod encoder;
pub mod error;
pub mod fee;
pub mod fields;
pub mod form;
pub mod paths;
pub mod project;
pub mod schema;
pub mod settings;
pub mod state;
pub mod submission;
