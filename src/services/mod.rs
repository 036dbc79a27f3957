pub mod dashboard;
pub mod dispensing;
pub mod drugs;
pub mod inventory;
pub mod prescriptions;
pub mod users;
