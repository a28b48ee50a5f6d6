pub mod character;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod model;
pub mod rasterizer;

pub use character::Character;
pub use error::ModelError;
pub use model::Model;
pub use rasterizer::Rasterizer;
