mod queue;
mod service;
mod stop;

pub use queue::{Closed, QueueConsumer, QueueProducer, TransferQueue};
pub use service::Service;
pub use stop::{channel as stop_channel, StopRx, StopTx};
