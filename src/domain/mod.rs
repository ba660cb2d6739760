// Domain layer: card models and the ports the core is written against.

pub mod model;
pub mod ports;
