// Domain layer: row, property and result models plus the ports the pipeline is written against.

pub mod model;
pub mod ports;
