pub mod address;
pub mod constants;
pub mod fees;
pub mod script;
