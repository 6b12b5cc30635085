mod connection;

pub use connection::{bootstrap_admin, check_health, create_pool};
