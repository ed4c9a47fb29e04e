mod probe;
mod wait_db;

pub use probe::run_probe;
pub use wait_db::run_wait_db;
