// Domain layer: models and ports (interfaces). No knowledge of the backend wire format.

pub mod model;
pub mod ports;
