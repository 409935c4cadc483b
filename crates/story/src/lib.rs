mod action;
pub mod chapter;
pub mod chart;
pub mod choreography;
pub mod error;
pub mod orchestrator;
pub mod presentation;
pub mod recording;
pub mod script;
pub mod surface;
pub mod tracks;

pub use chapter::*;
pub use chart::*;
pub use choreography::{ChapterContext, LiveVisuals};
pub use error::*;
pub use orchestrator::{StepOutcome, TransitionState};
pub use presentation::*;
pub use recording::*;
pub use script::*;
pub use surface::*;
pub use tracks::*;
