use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::PresentMode;
use clap::Parser;
use miette::miette;

use galleria_scene::{GalleriaConfig, GalleriaScenePlugin, Theme};

#[derive(Parser)]
#[command(author, version, about = "Infinite scrolling image tunnel", long_about = None)]
struct Cli {
    /// Directory under assets/ to scan for tunnel images
    #[arg(short, long)]
    images: Option<String>,
    /// Seed for slab placement
    #[arg(long)]
    seed: Option<u64>,
    /// Start in the light theme (toggle at runtime with T)
    #[arg(long)]
    light: bool,
    /// Autonomous drift speed, in scroll units per frame
    #[arg(long)]
    drift: Option<f32>,
}

impl Cli {
    fn config(self) -> GalleriaConfig {
        let mut config = GalleriaConfig::from_env();
        if self.images.is_some() {
            config.image_dir = self.images;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(drift) = self.drift {
            config.drift_step = drift;
        }
        if self.light {
            config.start_theme = Theme::Light;
        }
        config
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "galleria".into(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            })
            .set(LogPlugin {
                filter: "info,wgpu=error,naga=warn".into(),
                ..default()
            }),
    )
    .insert_resource(cli.config())
    .add_plugins(GalleriaScenePlugin);

    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => Err(miette!("renderer exited with error code {code}")),
    }
}
