pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod library;
pub mod order;
pub mod scheduler;
pub mod store;
pub mod tasks {
    pub mod loader;
    pub mod presenter;
    pub mod viewer;
}
