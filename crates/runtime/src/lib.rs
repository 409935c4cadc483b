pub mod event_bus;
pub mod event_loop;
pub mod frame;
pub mod frame_requests;
pub mod metrics;
pub mod timers;

pub use event_bus::*;
pub use event_loop::*;
pub use frame::*;
pub use frame_requests::*;
pub use metrics::*;
pub use timers::*;
