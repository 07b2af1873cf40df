// loader.rs — single-shot background image loading
//
// Every request runs on its own worker thread and reports back over a
// channel. Requests are numbered; only the newest number may reach the
// viewer, so a slow load that finishes after a newer request is dropped.

use crate::error::LoadError;
use crate::projection::ImageSize;
use image::io::Reader as ImageReader;
use image::RgbaImage;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Decoded panorama pixels. Immutable once created.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Result<Self, LoadError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(LoadError::EmptyImage);
        }
        Ok(Self {
            pixels: Arc::new(pixels),
        })
    }

    /// Decodes any format `image` can guess from the bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?;
        reader.no_limits();
        let img = reader.decode()?;
        Self::new(img.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width(), self.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Turns a URL into raw encoded image bytes.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// `http(s)://` via reqwest, `file://` and plain paths from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlFetcher;

impl ImageFetcher for UrlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let http_err = |source| LoadError::Http {
                url: url.to_string(),
                source,
            };
            let resp = reqwest::blocking::get(url).map_err(http_err)?;
            if !resp.status().is_success() {
                return Err(LoadError::Status {
                    url: url.to_string(),
                    status: resp.status().as_u16(),
                });
            }
            let bytes = resp.bytes().map_err(http_err)?;
            return Ok(bytes.to_vec());
        }

        let path = match url.strip_prefix("file://") {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(url),
        };
        std::fs::read(&path).map_err(|source| LoadError::Io { path, source })
    }
}

/// Identifies one `request()`; newer tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

struct Completed {
    ticket: LoadTicket,
    url: String,
    result: Result<SourceImage, LoadError>,
}

pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    latest: Arc<AtomicU64>,
    pending: Option<LoadTicket>,
    discarded: u64,
    tx: Sender<Completed>,
    rx: Receiver<Completed>,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        let (tx, rx) = channel();
        Self {
            fetcher,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
            discarded: 0,
            tx,
            rx,
        }
    }

    /// Starts loading `url`. Any earlier request becomes stale.
    pub fn request(&mut self, url: &str) -> LoadTicket {
        let ticket = LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        self.pending = Some(ticket);

        if url.trim().is_empty() {
            let _ = self.tx.send(Completed {
                ticket,
                url: url.to_string(),
                result: Err(LoadError::EmptyUrl),
            });
            return ticket;
        }

        log::info!("loading panorama {url} (request {})", ticket.0);
        let url = url.to_string();
        let fetcher = Arc::clone(&self.fetcher);
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = fetcher.fetch(&url).and_then(|bytes| {
                // skip the decode if a newer request already took over
                if latest.load(Ordering::SeqCst) != ticket.0 {
                    return Err(LoadError::Superseded);
                }
                SourceImage::decode(&bytes)
            });
            // receiver gone means the viewer was closed
            let _ = tx.send(Completed {
                ticket,
                url,
                result,
            });
        });
        ticket
    }

    /// Makes every in-flight request stale.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("cancelling pending panorama load");
        }
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Stale completions dropped so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Non-blocking. Returns the outcome of the newest request once it lands.
    pub fn poll(&mut self) -> Option<Result<SourceImage, LoadError>> {
        let mut outcome = None;
        while let Ok(done) = self.rx.try_recv() {
            if Some(done.ticket) != self.pending {
                self.discarded += 1;
                log::debug!("discarding stale load of {} (request {})", done.url, done.ticket.0);
                continue;
            }
            self.pending = None;
            match &done.result {
                Ok(img) => log::info!(
                    "panorama {} loaded: {}x{}",
                    done.url,
                    img.width(),
                    img.height()
                ),
                Err(e) => log::warn!("panorama {} failed to load: {e}", done.url),
            }
            outcome = Some(done.result);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgba};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([20, 120, 200, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    struct MapFetcher(HashMap<String, Vec<u8>>);

    impl ImageFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
            self.0.get(url).cloned().ok_or_else(|| LoadError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn wait_for(loader: &mut ImageLoader) -> Result<SourceImage, LoadError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(r) = loader.poll() {
                return r;
            }
            assert!(Instant::now() < deadline, "load never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn loads_and_reports_dimensions() {
        let fetcher = MapFetcher(HashMap::from([("pano.png".to_string(), png(30, 10))]));
        let mut loader = ImageLoader::new(Arc::new(fetcher));
        loader.request("pano.png");
        assert!(loader.is_pending());
        let img = wait_for(&mut loader).unwrap();
        assert_eq!(img.size(), ImageSize::new(30, 10));
        assert!(!loader.is_pending());
    }

    #[test]
    fn missing_and_garbage_inputs_fail() {
        let fetcher = MapFetcher(HashMap::from([("junk.png".to_string(), b"not an image".to_vec())]));
        let mut loader = ImageLoader::new(Arc::new(fetcher));

        loader.request("missing.png");
        assert!(matches!(wait_for(&mut loader), Err(LoadError::Status { status: 404, .. })));

        loader.request("junk.png");
        assert!(matches!(wait_for(&mut loader), Err(LoadError::Decode(_))));

        loader.request("  ");
        assert!(matches!(loader.poll(), Some(Err(LoadError::EmptyUrl))));
    }

    #[test]
    fn cancel_drops_in_flight_result() {
        struct Gate(Mutex<Option<Receiver<()>>>);
        impl ImageFetcher for Gate {
            fn fetch(&self, _url: &str) -> Result<Vec<u8>, LoadError> {
                let rx = self.0.lock().unwrap().take().unwrap();
                rx.recv().unwrap();
                Ok(png(4, 2))
            }
        }
        let (open, gate) = channel();
        let mut loader = ImageLoader::new(Arc::new(Gate(Mutex::new(Some(gate)))));
        loader.request("slow.png");
        loader.cancel();
        assert!(!loader.is_pending());
        open.send(()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while loader.discarded() == 0 {
            assert!(loader.poll().is_none());
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn url_fetcher_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pano.png");
        std::fs::write(&path, png(6, 3)).unwrap();

        let plain = UrlFetcher.fetch(path.to_str().unwrap()).unwrap();
        let url = format!("file://{}", path.display());
        let via_scheme = UrlFetcher.fetch(&url).unwrap();
        assert_eq!(plain, via_scheme);
        assert_eq!(SourceImage::decode(&plain).unwrap().size(), ImageSize::new(6, 3));

        let missing = dir.path().join("nope.png");
        assert!(matches!(
            UrlFetcher.fetch(missing.to_str().unwrap()),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn zero_sized_pixels_are_rejected() {
        assert!(matches!(SourceImage::new(RgbaImage::new(0, 5)), Err(LoadError::EmptyImage)));
    }
}
