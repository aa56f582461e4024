pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod fit;
pub mod geom;
pub mod input;
pub mod range;
pub mod render;
pub mod surface;
pub mod viewer;
pub mod world;
