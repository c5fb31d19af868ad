// Domain layer: appointment models, sequencing rules and ports (interfaces).

pub mod datetime;
pub mod model;
pub mod ports;
pub mod rules;
