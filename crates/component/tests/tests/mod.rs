mod common;
mod config;
mod definitions;
mod envelope;
mod registry;
