pub mod health;
pub mod smoke;
