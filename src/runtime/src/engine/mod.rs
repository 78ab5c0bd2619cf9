//! Local container engine clients.

mod docker;

pub use docker::DockerCli;
