pub mod core;
pub mod schemas;
pub mod services;
pub mod store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::{config::Settings, telemetry};
use crate::services::model_client::ChatModelClient;
use crate::services::pipeline::FeedbackPipeline;
use crate::store::ProfileStore;

/// Composition root for an embedding application: loads settings from the
/// environment, initializes tracing, and wires a pipeline around a fresh
/// in-memory store and the configured chat-completions client.
pub fn bootstrap() -> anyhow::Result<FeedbackPipeline> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let model = ChatModelClient::from_settings(&settings)?;
    let store = ProfileStore::new();

    tracing::info!(
        model = %settings.ai().model,
        environment = %settings.runtime().environment.as_str(),
        "Codetta feedback core ready"
    );

    Ok(FeedbackPipeline::new(store, Arc::new(model)))
}
