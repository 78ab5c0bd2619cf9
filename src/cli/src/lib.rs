//! ecr-porter CLI - push, pull and list images in Amazon ECR.

pub mod commands;
pub mod lister;
pub mod output;
