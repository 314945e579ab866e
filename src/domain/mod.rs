// Domain layer: value objects, row model and the provider port.

pub mod contracts;
pub mod model;
pub mod ports;
