pub mod config;
pub mod error;
pub mod fonts;
pub mod hotspot;
pub mod i18n;
pub mod interaction;
pub mod loader;
pub mod projection;
pub mod renderer;
pub mod scheduler;
pub mod view_state;
pub mod viewer;

pub use config::ViewerConfig;
pub use error::{ConfigError, LoadError, RendererError};
pub use interaction::{Control, InputEvent, TouchPhase};
pub use loader::{ImageFetcher, SourceImage, UrlFetcher};
pub use projection::{ImageSize, OutputSize};
pub use scheduler::{Clock, ManualClock, SystemClock};
pub use view_state::ViewState;
pub use viewer::{ControlOutcome, DisplayState, Frame, ItemType, LoadSettled, Viewer, ViewerProps};
