use bevy::prelude::*;
use evo_steer::config::FIELD_HEIGHT;
use evo_steer::{Outcome, Population, Shape};

/// Ticks run per frame while drawing is switched off
pub const FAST_FORWARD_TICKS: usize = 50;

/// Display toggles for the scene and the stats chart
#[derive(Resource)]
pub struct RenderSettings {
    pub render: bool,
    pub show_info: bool,
    pub show_stats: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            render: true,
            show_info: true,
            show_stats: false,
        }
    }
}

/// Marker for the sprite of the individual at this index
#[derive(Component)]
pub struct Bubble(pub usize);

/// Marker for everything hidden when drawing is off
#[derive(Component)]
pub struct SceneItem;

/// Shared materials for the three bubble states
#[derive(Resource)]
pub struct BubbleMaterials {
    active: Handle<ColorMaterial>,
    completed: Handle<ColorMaterial>,
    stuck: Handle<ColorMaterial>,
}

impl BubbleMaterials {
    fn for_outcome(&self, outcome: Outcome) -> Handle<ColorMaterial> {
        match outcome {
            Outcome::Active => self.active.clone(),
            Outcome::Completed(_) => self.completed.clone(),
            Outcome::Stuck(_) => self.stuck.clone(),
        }
    }
}

/// Field coordinates grow downwards from the top-left corner; the camera
/// looks at the field centre with y up
fn to_world(field: Vec2, size: Vec2, z: f32) -> Vec3 {
    Vec3::new(field.x - size.x / 2.0, size.y / 2.0 - field.y, z)
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    population: Res<Population>,
) {
    let env = population.environment();
    let size = env.size;

    commands.spawn((
        Camera2d,
        OrthographicProjection {
            scale: size.y.max(1.0) / FIELD_HEIGHT,
            ..OrthographicProjection::default_2d()
        },
    ));

    // Field background
    commands.spawn((
        SceneItem,
        Mesh2d(meshes.add(Rectangle::new(size.x, size.y))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgb(0.05, 0.05, 0.07)))),
        Transform::from_xyz(0.0, 0.0, -1.0),
    ));

    // Target rings
    let target = to_world(env.target, size, 0.0);
    let ring = materials.add(ColorMaterial::from_color(Color::srgba(0.08, 0.78, 0.4, 0.4)));
    for (i, radius) in [20.0, 15.0, 10.0].into_iter().enumerate() {
        commands.spawn((
            SceneItem,
            Mesh2d(meshes.add(Circle::new(radius))),
            MeshMaterial2d(ring.clone()),
            Transform::from_translation(target.with_z(0.1 * (i + 1) as f32)),
        ));
    }

    let obstacle = materials.add(ColorMaterial::from_color(Color::srgb(0.59, 0.2, 0.2)));
    for shape in &env.obstacles {
        spawn_shape(&mut commands, &mut meshes, obstacle.clone(), shape, size);
    }

    let bubble_materials = BubbleMaterials {
        active: materials.add(ColorMaterial::from_color(Color::srgba(0.2, 0.4, 0.8, 0.4))),
        completed: materials.add(ColorMaterial::from_color(Color::srgba(0.08, 0.78, 0.4, 0.4))),
        stuck: materials.add(ColorMaterial::from_color(Color::srgba(1.0, 0.2, 0.2, 0.2))),
    };
    let bubble = meshes.add(Circle::new(population.config().agent_radius));
    for (index, individual) in population.individuals().iter().enumerate() {
        commands.spawn((
            SceneItem,
            Bubble(index),
            Mesh2d(bubble.clone()),
            MeshMaterial2d(bubble_materials.for_outcome(individual.outcome())),
            Transform::from_translation(to_world(individual.position(), size, 2.0)),
        ));
    }
    commands.insert_resource(bubble_materials);
}

fn spawn_shape(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    material: Handle<ColorMaterial>,
    shape: &Shape,
    size: Vec2,
) {
    match shape {
        Shape::Polygon { bounds, .. } => {
            // Obstacles are authored as rectangles; other polygons draw as their bounding box
            commands.spawn((
                SceneItem,
                Mesh2d(meshes.add(Rectangle::from_size(bounds.size()))),
                MeshMaterial2d(material),
                Transform::from_translation(to_world(bounds.center(), size, 0.5)),
            ));
        }
        Shape::Ellipse { center, radii } => {
            commands.spawn((
                SceneItem,
                Mesh2d(meshes.add(Ellipse::new(radii.x, radii.y))),
                MeshMaterial2d(material),
                Transform::from_translation(to_world(*center, size, 0.5)),
            ));
        }
        Shape::Group { shapes, .. } => {
            for shape in shapes {
                spawn_shape(commands, meshes, material.clone(), shape, size);
            }
        }
    }
}

/// Run the engine for this frame: one tick normally, many while drawing is off
pub fn run_population(mut population: ResMut<Population>, settings: Res<RenderSettings>) {
    let ticks = if settings.render { 1 } else { FAST_FORWARD_TICKS };
    for _ in 0..ticks {
        if population.is_paused() {
            break;
        }
        if !population.step() {
            population.regenerate();
        }
    }
}

/// Move each bubble sprite to its individual's position and colour it by state
pub fn sync_bubbles(
    population: Res<Population>,
    bubble_materials: Res<BubbleMaterials>,
    mut bubbles: Query<(&Bubble, &mut Transform, &mut MeshMaterial2d<ColorMaterial>)>,
) {
    let size = population.environment().size;
    for (bubble, mut transform, mut material) in bubbles.iter_mut() {
        let Some(individual) = population.individuals().get(bubble.0) else {
            continue;
        };
        transform.translation = to_world(individual.position(), size, 2.0);
        let wanted = bubble_materials.for_outcome(individual.outcome());
        if material.0 != wanted {
            material.0 = wanted;
        }
    }
}

/// Hide the scene while drawing is off
pub fn apply_visibility(settings: Res<RenderSettings>, mut items: Query<&mut Visibility, With<SceneItem>>) {
    if !settings.is_changed() {
        return;
    }
    let visibility = if settings.render {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut item in items.iter_mut() {
        *item = visibility;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_maps_to_centred_world() {
        let size = Vec2::new(600.0, 400.0);
        assert_eq!(to_world(Vec2::ZERO, size, 0.0), Vec3::new(-300.0, 200.0, 0.0));
        assert_eq!(to_world(Vec2::new(600.0, 400.0), size, 1.0), Vec3::new(300.0, -200.0, 1.0));
        assert_eq!(to_world(Vec2::new(300.0, 200.0), size, 0.0), Vec3::ZERO);
    }
}
