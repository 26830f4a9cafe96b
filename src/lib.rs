// lib.rs
pub mod boundary_seeker;
pub mod error;
pub mod flag;
pub mod geometry;
pub mod map;
pub mod map_config;
pub mod outline;
pub mod state;
pub mod tile;
pub mod validity;
pub mod vertex;
