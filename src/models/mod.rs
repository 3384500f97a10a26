pub mod assignment;
pub mod driver;
pub mod payment;
pub mod ride;
pub mod rider;
pub mod trip;
