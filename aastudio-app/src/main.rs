mod app;
mod assets;
mod camera;
mod settings;
mod state;
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn,naga=warn"),
    )
    .init();

    let settings = settings::Settings::from_env();
    log::info!("Asset root: {}", settings.asset_root.display());
    app::run(settings)
}
