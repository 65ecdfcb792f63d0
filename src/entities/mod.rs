pub mod booking;
pub mod payment;
pub mod trip;
pub mod user;
