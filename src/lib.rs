pub mod app;
pub mod audio;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod fractal;
pub mod mapper;
pub mod render;
pub mod signal;
pub mod terminal;
