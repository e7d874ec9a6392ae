pub mod api;
pub mod client;
pub mod config;
pub mod connections;
pub mod effects;
pub mod requests;
pub mod schema_metadata;
pub mod settings;
pub mod settings_panel;
pub mod workbench;

#[cfg(test)]
mod test_support;
