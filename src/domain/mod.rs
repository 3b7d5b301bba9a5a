//! Domain model for the checkout pipeline: value objects, entities, the pure
//! pricing/risk rules, and the ports the application layer drives.

pub mod cart;
pub mod delivery;
pub mod money;
pub mod order;
pub mod ports;
pub mod quota;
pub mod risk;
pub mod seller;
pub mod shipping;
