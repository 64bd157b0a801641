pub mod config;
pub mod geometry_parser;
pub mod image;
