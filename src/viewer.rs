// viewer.rs — the panorama viewer: loader + view state + input + frame scheduling

use crate::config::ViewerConfig;
use crate::interaction::{Control, InputEvent, InteractionController};
use crate::loader::{ImageFetcher, ImageLoader, SourceImage};
use crate::projection::{place_hotspots, project, Blit, HotspotMarker, ImageSize, OutputSize};
use crate::scheduler::{Clock, FrameScheduler};
use crate::view_state::ViewState;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Destination,
    Marketplace,
    Restaurant,
    Hotel,
    Other,
}

impl From<&str> for ItemType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "destination" => ItemType::Destination,
            "marketplace" => ItemType::Marketplace,
            "restaurant" => ItemType::Restaurant,
            "hotel" => ItemType::Hotel,
            _ => ItemType::Other,
        }
    }
}

impl ItemType {
    pub fn icon(self) -> &'static str {
        match self {
            ItemType::Destination => "🏔",
            ItemType::Marketplace => "🛍",
            ItemType::Restaurant => "🍴",
            ItemType::Hotel => "🏨",
            ItemType::Other => "📍",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            ItemType::Destination => "item.destination",
            ItemType::Marketplace => "item.marketplace",
            ItemType::Restaurant => "item.restaurant",
            ItemType::Hotel => "item.hotel",
            ItemType::Other => "item.other",
        }
    }
}

/// What the host hands the viewer.
pub struct ViewerProps {
    pub image_url: String,
    pub item_name: String,
    pub item_type: ItemType,
    pub description: Option<String>,
    pub on_close: Box<dyn FnMut()>,
}

impl ViewerProps {
    pub fn new(
        image_url: impl Into<String>,
        item_name: impl Into<String>,
        item_type: ItemType,
        on_close: impl FnMut() + 'static,
    ) -> Self {
        Self {
            image_url: image_url.into(),
            item_name: item_name.into(),
            item_type,
            description: None,
            on_close: Box::new(on_close),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let d = description.into();
        self.description = (!d.trim().is_empty()).then_some(d);
        self
    }
}

impl fmt::Debug for ViewerProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerProps")
            .field("image_url", &self.image_url)
            .field("item_name", &self.item_name)
            .field("item_type", &self.item_type)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum DisplayState {
    Loading,
    Ready(SourceImage),
    /// Terminal until a new URL is set.
    Unavailable { reason: String },
    Closed,
}

/// Result of a load landing in `poll_loader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSettled {
    Ready(ImageSize),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    Ignored,
    Changed,
    /// The host should enter (true) or leave (false) fullscreen.
    FullscreenRequested(bool),
    Closed,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub output: OutputSize,
    pub image: ImageSize,
    pub blits: Vec<Blit>,
    pub hotspots: Vec<HotspotMarker>,
}

pub struct Viewer {
    props: ViewerProps,
    config: ViewerConfig,
    view: ViewState,
    controller: InteractionController,
    scheduler: FrameScheduler,
    loader: ImageLoader,
    display: DisplayState,
    show_info: bool,
    fullscreen: bool,
}

impl Viewer {
    /// Mounts the viewer and starts the one load for `props.image_url`.
    pub fn open(
        props: ViewerProps,
        config: ViewerConfig,
        fetcher: Arc<dyn ImageFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let controller =
            InteractionController::new(config.drag_sensitivity(), config.zoom_step, config.autoplay);
        let mut viewer = Self {
            props,
            config,
            view: ViewState::new(),
            controller,
            scheduler: FrameScheduler::new(clock),
            loader: ImageLoader::new(fetcher),
            display: DisplayState::Loading,
            show_info: false,
            fullscreen: false,
        };
        log::info!(
            "opening viewer for {} ({:?})",
            viewer.props.item_name,
            viewer.props.item_type
        );
        viewer.loader.request(&viewer.props.image_url);
        viewer
    }

    pub fn props(&self) -> &ViewerProps {
        &self.props
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.controller
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        match &self.display {
            DisplayState::Ready(img) => Some(img),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.display, DisplayState::Closed)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_info_visible(&self) -> bool {
        self.show_info
    }

    /// The description, only while the info toggle is on.
    pub fn visible_description(&self) -> Option<&str> {
        if self.show_info {
            self.props.description.as_deref()
        } else {
            None
        }
    }

    /// Switches to another image. The previous load, if still running, is
    /// ignored from now on. Returns false when nothing changed (viewer closed,
    /// or the URL is the one already shown), in which case the current image
    /// stays valid.
    pub fn set_image_url(&mut self, url: impl Into<String>) -> bool {
        if !self.is_open() {
            return false;
        }
        let url = url.into();
        if url == self.props.image_url {
            return false;
        }
        log::info!("image changed to {url}");
        self.props.image_url = url;
        self.display = DisplayState::Loading;
        self.loader.request(&self.props.image_url);
        self.sync_scheduler();
        true
    }

    /// Applies a finished load, if any. Call once per event-loop turn.
    pub fn poll_loader(&mut self) -> Option<LoadSettled> {
        if !self.is_open() {
            return None;
        }
        let settled = match self.loader.poll()? {
            Ok(img) => {
                let size = img.size();
                self.display = DisplayState::Ready(img);
                LoadSettled::Ready(size)
            }
            Err(e) => {
                self.display = DisplayState::Unavailable {
                    reason: e.to_string(),
                };
                LoadSettled::Unavailable
            }
        };
        self.sync_scheduler();
        Some(settled)
    }

    /// Pointer / touch input. Returns true when the view changed.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        let changed = self.controller.handle(event, &mut self.view);
        self.sync_scheduler();
        changed
    }

    pub fn control_enabled(&self, control: Control) -> bool {
        if !self.is_open() {
            return false;
        }
        match control {
            Control::ZoomIn => self.view.can_zoom_in(),
            Control::ZoomOut => self.view.can_zoom_out(),
            Control::TogglePlay => !self.controller.is_dragging(),
            Control::Reset | Control::ToggleInfo | Control::ToggleFullscreen | Control::Close => true,
        }
    }

    pub fn activate(&mut self, control: Control) -> ControlOutcome {
        if !self.is_open() {
            return ControlOutcome::Ignored;
        }
        let outcome = match control {
            Control::ToggleInfo => {
                self.show_info = !self.show_info;
                ControlOutcome::Changed
            }
            Control::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                ControlOutcome::FullscreenRequested(self.fullscreen)
            }
            Control::Close => {
                (self.props.on_close)();
                self.close();
                return ControlOutcome::Closed;
            }
            _ => {
                if self.controller.activate(control, &mut self.view) {
                    ControlOutcome::Changed
                } else {
                    ControlOutcome::Ignored
                }
            }
        };
        self.sync_scheduler();
        outcome
    }

    /// The host could not honour the last fullscreen request.
    pub fn fullscreen_failed(&mut self) {
        log::debug!("fullscreen request was not honoured");
        self.fullscreen = !self.fullscreen;
    }

    /// One animation-frame callback. Returns true when auto-rotation moved the view.
    pub fn animation_frame(&mut self) -> bool {
        if self.scheduler.tick().is_none() {
            return false;
        }
        self.view.rotate(self.config.auto_rotate_step_deg);
        true
    }

    /// Projects the current view. `None` while there is nothing to draw.
    pub fn frame(&self, output: OutputSize) -> Option<Frame> {
        let img = self.source_image()?;
        if output.is_empty() {
            return None;
        }
        let time = self.scheduler.now();
        Some(Frame {
            output,
            image: img.size(),
            blits: project(&self.view, img.size(), output),
            hotspots: place_hotspots(&self.config.hotspots, &self.config.pulse, output, time),
        })
    }

    /// Unmounts: cancels the load, stops the frame chain and drops the image.
    /// Safe to call more than once.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.loader.cancel();
        self.scheduler.stop();
        self.display = DisplayState::Closed;
        log::info!("viewer for {} closed", self.props.item_name);
    }

    // auto-rotation only runs while an image is on screen
    fn sync_scheduler(&mut self) {
        let should_run = matches!(self.display, DisplayState::Ready(_)) && self.controller.is_auto_rotating();
        if should_run && !self.scheduler.is_running() {
            self.scheduler.start();
        } else if !should_run && self.scheduler.is_running() {
            self.scheduler.stop();
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.close();
    }
}
