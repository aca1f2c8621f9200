// Domain layer: core models and ports (interfaces) for ingestion and orchestration.

pub mod model;
pub mod ports;
