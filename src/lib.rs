pub mod cli;
pub mod config;
pub mod game;
pub mod persistence;
pub mod view;
pub mod world;
