pub mod vec2;
pub mod weighted;
