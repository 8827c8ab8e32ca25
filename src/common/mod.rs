//! Common utilities and shared functionality

pub mod traits;

pub use traits::{ChannelMembership, Clock, ManualClock, StaticMembership, SystemClock};
