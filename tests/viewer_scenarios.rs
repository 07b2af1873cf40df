// End-to-end viewer scenarios with an in-memory fetcher and a manual clock.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use glam::DVec2;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use tour_panorama::{
    Control, ControlOutcome, DisplayState, ImageFetcher, ImageSize, InputEvent, ItemType, LoadError,
    LoadSettled, ManualClock, OutputSize, Viewer, ViewerConfig, ViewerProps,
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([90, 160, 220, 255])))
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    buf
}

/// Serves a fixed image per URL; URLs registered as gated block until released.
#[derive(Default)]
struct TestFetcher {
    images: HashMap<String, Vec<u8>>,
    gates: Mutex<HashMap<String, Receiver<()>>>,
}

impl TestFetcher {
    fn serve(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }

    fn gate(self, url: &str) -> (Self, Sender<()>) {
        let (tx, rx) = channel();
        self.gates.lock().unwrap().insert(url.to_string(), rx);
        (self, tx)
    }
}

impl ImageFetcher for TestFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let gate = self.gates.lock().unwrap().remove(url);
        if let Some(rx) = gate {
            let _ = rx.recv();
        }
        self.images.get(url).cloned().ok_or_else(|| LoadError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

fn open(url: &str, fetcher: TestFetcher) -> (Viewer, ManualClock) {
    let clock = ManualClock::new();
    let props = ViewerProps::new(url, "Lighthouse Point", ItemType::Destination, || {});
    let viewer = Viewer::open(
        props,
        ViewerConfig::default(),
        Arc::new(fetcher),
        Arc::new(clock.clone()),
    );
    (viewer, clock)
}

fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out");
        thread::sleep(Duration::from_millis(5));
    }
}

fn settle(viewer: &mut Viewer) -> LoadSettled {
    let mut settled = None;
    wait_until(|| {
        settled = viewer.poll_loader();
        settled.is_some()
    });
    settled.unwrap()
}

#[test]
fn initial_slice_for_a_1200_by_600_image() {
    let (mut viewer, _clock) = open("pano.png", TestFetcher::default().serve("pano.png", png(1200, 600)));
    assert_eq!(settle(&mut viewer), LoadSettled::Ready(ImageSize::new(1200, 600)));

    let frame = viewer.frame(OutputSize::new(800, 400)).unwrap();
    assert_eq!(frame.blits.len(), 1);
    assert_eq!(frame.blits[0].src.min.x, 0.0);
    assert!((frame.blits[0].src.size.x - 400.0).abs() < 1e-9);
    assert_eq!(frame.hotspots.len(), 3);
}

#[test]
fn drag_of_100_px_turns_30_degrees() {
    let (mut viewer, _clock) = open("pano.png", TestFetcher::default().serve("pano.png", png(1200, 600)));
    settle(&mut viewer);

    viewer.handle_input(InputEvent::PointerDown(DVec2::new(200.0, 100.0)));
    assert!(!viewer.interaction().is_auto_rotating());
    assert!(viewer.handle_input(InputEvent::PointerMove(DVec2::new(300.0, 100.0))));
    assert!((viewer.view().yaw() - 30.0).abs() < 1e-9);
    assert_eq!(viewer.view().pitch(), 0.0);

    // yaw 30 → slice starts at 100 px
    let frame = viewer.frame(OutputSize::new(800, 400)).unwrap();
    assert!((frame.blits[0].src.min.x - 100.0).abs() < 1e-9);
}

#[test]
fn zoom_in_until_the_ceiling() {
    let (mut viewer, _clock) = open("pano.png", TestFetcher::default().serve("pano.png", png(1200, 600)));
    settle(&mut viewer);

    for _ in 0..5 {
        assert_eq!(viewer.activate(Control::ZoomIn), ControlOutcome::Changed);
    }
    assert_eq!(viewer.view().zoom(), 2.0);
    for _ in 0..5 {
        viewer.activate(Control::ZoomIn);
    }
    assert_eq!(viewer.view().zoom(), 3.0);
    assert_eq!(viewer.activate(Control::ZoomIn), ControlOutcome::Ignored);
    assert_eq!(viewer.view().zoom(), 3.0);
}

#[test]
fn reset_twice_equals_reset_once() {
    let (mut viewer, _clock) = open("pano.png", TestFetcher::default().serve("pano.png", png(1200, 600)));
    settle(&mut viewer);

    viewer.handle_input(InputEvent::PointerDown(DVec2::ZERO));
    viewer.handle_input(InputEvent::PointerMove(DVec2::new(-50.0, 90.0)));
    viewer.handle_input(InputEvent::PointerUp);
    viewer.activate(Control::ZoomOut);
    assert!(!viewer.scheduler().is_running());

    viewer.activate(Control::Reset);
    let once = *viewer.view();
    assert!(viewer.interaction().is_auto_rotating());
    assert!(viewer.scheduler().is_running());

    viewer.activate(Control::Reset);
    assert_eq!(*viewer.view(), once);
    assert_eq!((once.zoom(), once.pitch(), once.yaw()), (1.0, 0.0, 0.0));
    assert!(viewer.interaction().is_auto_rotating());
}

#[test]
fn only_the_latest_url_is_applied() {
    let fetcher = TestFetcher::default()
        .serve("slow.png", png(800, 400))
        .serve("fast.png", png(1200, 600));
    let (fetcher, release_slow) = fetcher.gate("slow.png");
    let (mut viewer, _clock) = open("slow.png", fetcher);

    viewer.set_image_url("fast.png");
    assert_eq!(settle(&mut viewer), LoadSettled::Ready(ImageSize::new(1200, 600)));

    release_slow.send(()).unwrap();
    // give the slow worker time to report back, then make sure it changed nothing
    let started = Instant::now();
    while started.elapsed() < Duration::from_millis(200) {
        assert_eq!(viewer.poll_loader(), None);
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(viewer.source_image().unwrap().size(), ImageSize::new(1200, 600));
}

#[test]
fn no_animation_callbacks_after_close() {
    let (mut viewer, clock) = open("pano.png", TestFetcher::default().serve("pano.png", png(1200, 600)));
    settle(&mut viewer);
    assert!(viewer.interaction().is_auto_rotating());

    for _ in 0..3 {
        clock.advance(Duration::from_millis(16));
        assert!(viewer.animation_frame());
    }
    let fired = viewer.scheduler().fired();
    let yaw = viewer.view().yaw();
    assert!((yaw - 0.6).abs() < 1e-9);

    viewer.close();
    for _ in 0..10 {
        clock.advance(Duration::from_millis(16));
        assert!(!viewer.animation_frame());
    }
    assert_eq!(viewer.scheduler().fired(), fired);
    assert_eq!(viewer.view().yaw(), yaw);
    assert!(matches!(viewer.display(), DisplayState::Closed));
    assert!(viewer.frame(OutputSize::new(800, 400)).is_none());
}

#[test]
fn load_finishing_after_close_is_ignored() {
    let fetcher = TestFetcher::default().serve("pano.png", png(1200, 600));
    let (fetcher, release) = fetcher.gate("pano.png");
    let (mut viewer, _clock) = open("pano.png", fetcher);

    viewer.close();
    release.send(()).unwrap();
    let started = Instant::now();
    while started.elapsed() < Duration::from_millis(200) {
        assert_eq!(viewer.poll_loader(), None);
        thread::sleep(Duration::from_millis(5));
    }
    assert!(viewer.source_image().is_none());
    assert!(!viewer.animation_frame());
}

#[test]
fn missing_image_is_unavailable_until_a_new_url() {
    let fetcher = TestFetcher::default().serve("good.png", png(300, 150));
    let (mut viewer, _clock) = open("missing.png", fetcher);
    assert_eq!(settle(&mut viewer), LoadSettled::Unavailable);
    match viewer.display() {
        DisplayState::Unavailable { reason } => assert!(reason.contains("404")),
        other => panic!("unexpected state {other:?}"),
    }
    assert!(viewer.frame(OutputSize::new(800, 400)).is_none());
    assert!(!viewer.animation_frame());

    viewer.set_image_url("good.png");
    assert!(matches!(viewer.display(), DisplayState::Loading));
    assert_eq!(settle(&mut viewer), LoadSettled::Ready(ImageSize::new(300, 150)));
}

#[test]
fn auto_rotation_wraps_across_the_seam() {
    let (mut viewer, _clock) = open("pano.png", TestFetcher::default().serve("pano.png", png(1200, 600)));
    settle(&mut viewer);

    // 0.2° per frame → 1500 frames for 300°
    for _ in 0..1500 {
        viewer.animation_frame();
    }
    assert!((viewer.view().normalized_yaw() - 300.0).abs() < 1e-6);

    let frame = viewer.frame(OutputSize::new(900, 300)).unwrap();
    assert_eq!(frame.blits.len(), 2);
    let covered: f64 = frame.blits.iter().map(|b| b.src.size.x).sum();
    assert!((covered - 400.0).abs() < 1e-6);
}

#[test]
fn dropping_the_same_image_again_keeps_it_on_screen() {
    let (mut viewer, _clock) = open("pano.png", TestFetcher::default().serve("pano.png", png(1200, 600)));
    settle(&mut viewer);

    assert!(!viewer.set_image_url("pano.png"));
    let started = Instant::now();
    while started.elapsed() < Duration::from_millis(100) {
        assert_eq!(viewer.poll_loader(), None);
        thread::sleep(Duration::from_millis(5));
    }
    assert!(matches!(viewer.display(), DisplayState::Ready(_)));
    assert!(viewer.frame(OutputSize::new(800, 400)).is_some());
}

#[test]
fn zoom_steps_that_round_away_report_no_change() {
    let clock = ManualClock::new();
    let config = ViewerConfig {
        zoom_step: 0.004,
        ..ViewerConfig::default()
    };
    let props = ViewerProps::new("pano.png", "Lighthouse Point", ItemType::Destination, || {});
    let mut viewer = Viewer::open(
        props,
        config,
        Arc::new(TestFetcher::default().serve("pano.png", png(1200, 600))),
        Arc::new(clock),
    );
    settle(&mut viewer);

    for _ in 0..5 {
        assert_eq!(viewer.activate(Control::ZoomIn), ControlOutcome::Ignored);
    }
    assert_eq!(viewer.view().zoom(), 1.0);
}
