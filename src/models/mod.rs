// src/models/mod.rs
pub mod complaint;
pub mod driver;
pub mod route;
pub mod shipment;
pub mod user;
pub mod vehicle;

pub use complaint::*;
pub use driver::*;
pub use route::*;
pub use shipment::*;
pub use user::*;
pub use vehicle::*;
