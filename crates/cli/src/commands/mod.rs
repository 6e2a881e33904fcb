pub mod history;
pub mod providers;
pub mod status;
