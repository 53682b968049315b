// Domain layer: argument model and the runner port.

pub mod model;
pub mod ports;
