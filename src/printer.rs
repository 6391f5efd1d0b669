pub mod config;
pub mod compose;
pub mod database;
pub mod render;
pub mod text;
pub mod pipeline;

pub use config::get_configuration;
pub use pipeline::run;
pub use pipeline::Summary;
