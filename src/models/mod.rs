mod contract;
mod stage;

pub use contract::*;
pub use stage::*;
