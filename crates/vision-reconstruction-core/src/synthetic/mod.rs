pub mod noise;
pub mod scene;

pub use noise::{UniformPointNoise, unit_sample};
pub use scene::{SceneBuilder, grid_on_plane, jittered, noise_blob};
