pub mod bbox;
pub mod detection;
pub mod direction;
pub mod distance;
pub mod hazard;
