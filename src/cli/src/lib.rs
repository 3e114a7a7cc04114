//! Modelcar CLI - extract model cards from modelcar images and build the models catalog.

pub mod commands;
