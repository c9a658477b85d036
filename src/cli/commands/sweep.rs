use crate::api::create_app_state_from_config;
use crate::config::Config;

pub async fn cmd_sweep(config: &Config) -> anyhow::Result<()> {
    let state = create_app_state_from_config(config.clone(), None).await?;
    let stats = state.sweeper.sweep().await?;

    println!(
        "Scanned {} stored images, deleted {} orphans ({} errors)",
        stats.scanned, stats.deleted, stats.errors
    );

    Ok(())
}
