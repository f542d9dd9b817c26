pub mod api;
pub mod config;
pub mod database_ops;
pub mod feeds;
pub mod logging;
pub mod sync;

pub mod util {
    pub mod env;
}
