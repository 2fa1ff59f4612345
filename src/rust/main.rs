use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;

use swifttrust_vision::config::Args;
use swifttrust_vision::server::{self, AppState};
use swifttrust_vision::{init_logger, BuiltinModel, Classifier, ModelManager};

async fn ensure_model_downloaded(manager: &ModelManager, fresh: bool) -> anyhow::Result<()> {
    let model = BuiltinModel::MobileNetV2;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }

    manager
        .ensure_model_downloaded(model)
        .await
        .with_context(|| format!("failed to prepare {:?}", model))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();

    let manager = ModelManager::new(args.models_dir())
        .with_context(|| format!("cannot create model cache at {:?}", args.models_dir()))?;
    ensure_model_downloaded(&manager, args.fresh).await?;

    let start_time = Instant::now();
    info!("Loading {}...", BuiltinModel::MobileNetV2.display_name());
    let classifier = Classifier::builder()
        .with_runtime_config(args.runtime_config())
        .with_model_from(&manager, BuiltinModel::MobileNetV2)?
        .build()?;
    info!("Model ready (took {:.2?})", start_time.elapsed());

    let state = AppState::new(Arc::new(classifier));
    let router = server::create_router(state, args.body_limit_bytes());
    server::serve(args.socket_addr(), router).await?;

    Ok(())
}
