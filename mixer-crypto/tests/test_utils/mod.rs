#![allow(dead_code)]

use mixer_crypto::{
    encryption::EncryptionKeyPair,
    statement::PuzzleKeys,
};
use rand::SeedableRng;
use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock},
};
use tracing::{field, Event, Level, Subscriber};
use tracing_subscriber::{layer::Context, prelude::*, Layer};

// Seeded rng for replicable tests.
pub fn seeded_rng() -> (impl rand::CryptoRng + rand::RngCore) {
    const TEST_RNG_SEED: [u8; 32] = *b"NEVER USE THIS FOR ANYTHING REAL";
    rand::rngs::StdRng::from_seed(TEST_RNG_SEED)
}

// Key generation dominates test time, so every test in a binary shares one pair of key pairs.
// 1024 bits leaves room for two multiplicative hops.
pub fn key_pairs() -> &'static (EncryptionKeyPair, EncryptionKeyPair) {
    static KEYS: OnceLock<(EncryptionKeyPair, EncryptionKeyPair)> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = seeded_rng();
        (
            EncryptionKeyPair::generate(&mut rng, 1024).unwrap(),
            EncryptionKeyPair::generate(&mut rng, 1024).unwrap(),
        )
    })
}

pub fn puzzle_keys() -> PuzzleKeys {
    let (auditor, hub) = key_pairs();
    PuzzleKeys {
        auditor: auditor.encryption_key().clone(),
        hub: hub.encryption_key().clone(),
    }
}

/// One event captured by a [`CollectingLayer`].
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl RecordedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

impl field::Visit for RecordedEvent {
    fn record_debug(&mut self, field: &field::Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_string(), rendered));
        }
    }
}

/// In-memory layer that records every event it sees.
#[derive(Debug, Default, Clone)]
pub struct CollectingLayer(Arc<Mutex<Vec<RecordedEvent>>>);

impl CollectingLayer {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for CollectingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut recorded = RecordedEvent {
            level: *event.metadata().level(),
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut recorded);
        self.0.lock().unwrap().push(recorded);
    }
}

/// Run `f` with a collecting subscriber installed on this thread.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<RecordedEvent>) {
    let layer = CollectingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let output = tracing::subscriber::with_default(subscriber, f);
    (output, layer.events())
}
