// Domain layer: client model, query values and ports (interfaces).

pub mod model;
pub mod ports;
pub mod query;
