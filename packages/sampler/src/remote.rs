//! Background fetches of street-level images.
//!
//! The frame loop must never block on the network. [`RemoteFetcher::request`]
//! spawns the fetch on a tokio runtime and returns immediately; finished
//! fetches come back over an unbounded channel that
//! [`RemoteFetcher::poll`] drains without waiting.
//!
//! Each pointer owns one fetch slot. A new request for a slot supersedes
//! the outstanding one by bumping the slot's generation, and completions
//! carrying an older generation are dropped on arrival.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use color_world_models::{Coordinate, SampledColor};
use image::DynamicImage;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::retry::{self, redact_key};
use crate::{REMOTE_PIXEL, SampleError, SampleOutcome, classify, pixel_at};

/// Street-level image endpoint. `{lat}`, `{lon}` and `{key}` are filled in
/// per request.
pub const DEFAULT_URL_TEMPLATE: &str = "https://maps.googleapis.com/maps/api/streetview?size=50x50&location={lat},{lon}&key={key}";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A pending fetch is kept when the next request for the same slot lies
/// within this many degrees on both axes.
pub const REFETCH_DISTANCE: f64 = 0.0001;

/// Fills the URL template for `location`.
#[must_use]
pub fn build_url(template: &str, location: Coordinate, api_key: &str) -> String {
    template
        .replace("{lat}", &format!("{:.6}", location.latitude))
        .replace("{lon}", &format!("{:.6}", location.longitude))
        .replace("{key}", api_key)
}

/// Something that can turn a URL into a decoded image.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches and decodes the image at `url`.
    async fn fetch(&self, url: &str) -> Result<DynamicImage, SampleError>;
}

/// [`ImageSource`] backed by a `reqwest` client.
pub struct HttpImageSource {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpImageSource {
    /// Creates a source whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, SampleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("color-world/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_retries,
        })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, SampleError> {
        let response = retry::send(|| self.client.get(url), self.max_retries).await?;
        let bytes = response.bytes().await?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

/// Lifecycle of one fetch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Pending,
    /// The latest fetch completed and was sampled.
    Resolved,
    /// The latest fetch failed; the previous color stays in effect.
    Failed,
}

/// A finished, current-generation fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    /// Slot the request was made for.
    pub slot: usize,
    /// Requested location.
    pub location: Coordinate,
    /// [`SampleOutcome::Accepted`], [`SampleOutcome::Rejected`], or
    /// [`SampleOutcome::Miss`] for an empty image.
    pub outcome: SampleOutcome,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u64,
    location: Option<Coordinate>,
    state: FetchState,
}

struct Message {
    slot: usize,
    generation: u64,
    location: Coordinate,
    result: Result<Option<SampledColor>, SampleError>,
}

/// Issues fetches on a runtime and collects their results.
pub struct RemoteFetcher {
    source: Arc<dyn ImageSource>,
    runtime: Handle,
    url_template: String,
    api_key: String,
    slots: Vec<Slot>,
    next_generation: u64,
    stale_discarded: u64,
    last_color: Option<SampledColor>,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl RemoteFetcher {
    /// Creates a fetcher that spawns onto `runtime`.
    #[must_use]
    pub fn new(
        source: Arc<dyn ImageSource>,
        runtime: Handle,
        url_template: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            url_template: url_template.into(),
            api_key: api_key.into(),
            slots: Vec::new(),
            next_generation: 0,
            stale_discarded: 0,
            last_color: None,
            tx,
            rx,
        }
    }

    /// Requests the image for `location` on `slot`.
    ///
    /// Returns `false` when an in-flight fetch for the slot already covers
    /// the location, `true` when a new fetch was spawned.
    pub fn request(&mut self, slot: usize, location: Coordinate) -> bool {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, Slot::default());
        }

        let current = self.slots[slot];
        if current.state == FetchState::Pending
            && current.location.is_some_and(|pending| {
                (pending.longitude - location.longitude).abs() < REFETCH_DISTANCE
                    && (pending.latitude - location.latitude).abs() < REFETCH_DISTANCE
            })
        {
            return false;
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.slots[slot] = Slot {
            generation,
            location: Some(location),
            state: FetchState::Pending,
        };

        let url = build_url(&self.url_template, location, &self.api_key);
        log::debug!("Fetching {} for slot {slot}", redact_key(&url));

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = source
                .fetch(&url)
                .await
                .map(|image| pixel_at(&image.to_rgb8(), REMOTE_PIXEL));
            // The receiver only goes away with the fetcher itself.
            let _ = tx.send(Message {
                slot,
                generation,
                location,
                result,
            });
        });

        true
    }

    /// Drains every completion that has already arrived.
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            if let Some(completion) = self.accept(message) {
                completions.push(completion);
            }
        }
        completions
    }

    /// Waits for the next current-generation completion.
    ///
    /// Failed and stale fetches are consumed along the way.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        loop {
            let message = self.rx.recv().await?;
            if let Some(completion) = self.accept(message) {
                return Some(completion);
            }
        }
    }

    fn accept(&mut self, message: Message) -> Option<Completion> {
        let slot = self.slots.get_mut(message.slot)?;
        if slot.generation != message.generation {
            self.stale_discarded += 1;
            log::trace!(
                "Discarding stale fetch for slot {} (generation {} < {})",
                message.slot,
                message.generation,
                slot.generation
            );
            return None;
        }

        match message.result {
            Ok(pixel) => {
                slot.state = FetchState::Resolved;
                let outcome = pixel.map_or(SampleOutcome::Miss, classify);
                if let SampleOutcome::Accepted(color) = outcome {
                    self.last_color = Some(color);
                }
                Some(Completion {
                    slot: message.slot,
                    location: message.location,
                    outcome,
                })
            }
            Err(e) => {
                slot.state = FetchState::Failed;
                log::warn!("Image fetch for {} failed: {e}", message.location);
                None
            }
        }
    }

    /// State of `slot`.
    #[must_use]
    pub fn state(&self, slot: usize) -> FetchState {
        self.slots.get(slot).map_or(FetchState::Idle, |s| s.state)
    }

    /// The last accepted color from any slot.
    #[must_use]
    pub const fn last_color(&self) -> Option<SampledColor> {
        self.last_color
    }

    /// Number of completions dropped because a newer request superseded
    /// them.
    #[must_use]
    pub const fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }
}
