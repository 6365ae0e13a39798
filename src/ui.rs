use crate::render::RenderSettings;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use evo_steer::{GenerationStats, Population};

const CHART_SIZE: egui::Vec2 = egui::vec2(400.0, 150.0);

/// Control buttons, generation info and the history chart
pub fn ui_system(mut contexts: EguiContexts, mut population: ResMut<Population>, mut settings: ResMut<RenderSettings>) {
    egui::Window::new("Simulation Info")
        .default_pos(egui::pos2(10.0, 10.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.horizontal(|ui| {
                let button_text = if population.is_paused() { "▶ Resume" } else { "⏸ Pause" };
                if ui.button(button_text).clicked() {
                    population.toggle_pause();
                }

                let state_text = if population.is_paused() { "Paused" } else { "Running" };
                ui.label(format!("State: {}", state_text));
            });

            // Copy out so the resource is only flagged changed on an actual toggle
            let (mut render, mut show_info, mut show_stats) = (settings.render, settings.show_info, settings.show_stats);
            ui.horizontal(|ui| {
                ui.checkbox(&mut render, "Render");
                ui.checkbox(&mut show_info, "Info");
                ui.checkbox(&mut show_stats, "Stats");
            });
            if (render, show_info, show_stats) != (settings.render, settings.show_info, settings.show_stats) {
                settings.render = render;
                settings.show_info = show_info;
                settings.show_stats = show_stats;
            }

            if !settings.render {
                ui.separator();
                ui.heading(format!("Generation {}", population.generation()));
                ui.label(format!("Tick {} / {}", population.tick(), population.lifespan()));
                ui.label(format!("Fitness {:.2}", population.last_fitness().max));
            }

            if settings.show_info {
                ui.separator();
                generation_info(ui, &population);
            }
        });

    if settings.show_stats && settings.render {
        egui::Window::new("History")
            .default_pos(egui::pos2(10.0, 420.0))
            .show(contexts.ctx_mut(), |ui| history_chart(ui, &population));
    }
}

fn generation_info(ui: &mut egui::Ui, population: &Population) {
    let last = population.last_fitness();
    let overall = population.overall();

    egui::Grid::new("generation_info").num_columns(2).show(ui, |ui| {
        let rows = [
            ("Generation:", population.generation().to_string()),
            ("Tick:", format!("{} / {}", population.tick(), population.lifespan())),
            (
                "New children:",
                format!("{} / {}", population.new_children(), population.population_size()),
            ),
            (
                "Mutations:",
                format!("{} / {}", population.mutation_count(), population.total_genes()),
            ),
            ("Last generation:", population.generation().saturating_sub(1).to_string()),
            ("Total fitness:", format!("{:.2}", last.total)),
            ("Min fitness:", format!("{:.2}", last.min)),
            ("Max fitness:", format!("{:.2}", last.max)),
            ("Best overall fitness:", format!("{:.2}", overall.best_fitness)),
        ];
        for (label, value) in rows {
            ui.label(label);
            ui.label(value);
            ui.end_row();
        }
    });
}

/// Line chart of every finished generation, each series scaled by its run-wide maximum
fn history_chart(ui: &mut egui::Ui, population: &Population) {
    let overall = population.overall();
    let history = population.history();

    let series: [(&str, egui::Color32, f32, fn(&GenerationStats) -> f32); 4] = [
        (
            "Total fitness",
            egui::Color32::WHITE,
            overall.highest_total_fitness,
            |s| s.fitness.total,
        ),
        (
            "Max fitness",
            egui::Color32::from_rgb(20, 200, 100),
            overall.best_fitness,
            |s| s.fitness.max,
        ),
        (
            "Min fitness",
            egui::Color32::from_rgb(255, 50, 50),
            overall.best_fitness,
            |s| s.fitness.min,
        ),
        (
            "Mutations",
            egui::Color32::from_rgb(120, 120, 255),
            overall.max_mutations as f32,
            |s| s.mutations as f32,
        ),
    ];

    for (label, color, scale, _) in &series {
        ui.colored_label(*color, format!("{} (0 - {})", label, scale.ceil()));
    }

    let (rect, _) = ui.allocate_exact_size(CHART_SIZE, egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, egui::Rounding::same(2.0), egui::Color32::from_black_alpha(160));

    if history.len() < 2 {
        return;
    }

    let x_step = rect.width() / (history.len() - 1) as f32;
    for (_, color, scale, value) in &series {
        if *scale <= 0.0 {
            continue;
        }
        let points: Vec<egui::Pos2> = history
            .iter()
            .enumerate()
            .map(|(i, stats)| {
                let y = (value(stats) / scale).clamp(0.0, 1.0);
                egui::pos2(rect.left() + x_step * i as f32, rect.bottom() - y * rect.height())
            })
            .collect();
        painter.add(egui::Shape::line(points, egui::Stroke::new(1.0, *color)));
    }
}
