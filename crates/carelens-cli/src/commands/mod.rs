pub mod login;
pub mod patients;
pub mod relay;
