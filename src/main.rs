mod render;
mod ui;

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use evo_steer::config::{FIELD_HEIGHT, FIELD_WIDTH};
use evo_steer::{Environment, Population, SimulationConfig};
use render::{RenderSettings, apply_visibility, run_population, setup_scene, sync_bubbles};
use ui::ui_system;

fn main() {
    let environment = Environment::with_default_obstacle(FIELD_WIDTH, FIELD_HEIGHT);
    let mut population = match Population::new(SimulationConfig::default(), environment) {
        Ok(population) => population,
        Err(err) => {
            eprintln!("invalid simulation configuration: {err}");
            std::process::exit(1);
        }
    };
    // Start paused so the scene can be inspected before the first tick
    population.pause();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Smart Bubbles".to_string(),
                resolution: (FIELD_WIDTH, FIELD_HEIGHT).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin)
        .insert_resource(population)
        .init_resource::<RenderSettings>()
        .add_systems(Startup, setup_scene)
        .add_systems(Update, (ui_system, run_population, sync_bubbles, apply_visibility).chain())
        .run();
}
