mod connection;
mod controller;
mod keepalive;
mod teardown;

pub use connection::{Connection, Reply, IO_TIMEOUT};
pub use controller::{Controller, Setup, State};
pub use keepalive::{interval as keepalive_interval, Schedule, DEFAULT_INTERVAL};
pub use teardown::{TeardownReport, TeardownStep};
