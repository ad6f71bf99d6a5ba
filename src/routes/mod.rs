pub mod crops;
pub mod health;
pub mod locations;
pub mod recommendations;
