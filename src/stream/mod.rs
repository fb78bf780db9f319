//! Consumption of the remote event stream
//!
//! [`StreamControl`] is shared with the gateway so that `stop()` reaches the
//! active session without the reader polling for it.

pub mod control;
pub mod reader;


pub use control::{StopHandle, StreamControl, StreamState};
pub use reader::{EventStream, StreamReader};
