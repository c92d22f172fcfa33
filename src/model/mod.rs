pub mod clock;
pub mod ephemeris;
pub mod picker;
pub mod record;
pub mod registry;
pub mod risk;
pub mod scheduler;

pub use clock::{ClockMode, SimulatedClock};
pub use ephemeris::{EphemerisSource, OrbitalState, StandardEphemeris};
pub use picker::{PickResult, PointerPicker, TooltipSink};
pub use registry::{ObjectId, TrackedObject, TrackedObjectRegistry};
pub use scheduler::{AnimationScheduler, FrameOutcome, RenderSink, StopHandle};
