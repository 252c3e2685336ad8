#![allow(dead_code)]

use mixer_crypto::{
    adaptor::SigningKey, encryption::EncryptionKeyPair, pedersen::Crs, statement::PuzzleKeys,
};
use mixer_protocol::{hub, receiver, sender, Parameters, PublicParameters, Strategy};
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

// 1024 bits clears the bound for two multiplicative hops, so both strategies share these.
pub fn key_pairs() -> &'static (EncryptionKeyPair, EncryptionKeyPair) {
    static KEYS: OnceLock<(EncryptionKeyPair, EncryptionKeyPair)> = OnceLock::new();
    KEYS.get_or_init(|| {
        let parameters = Parameters {
            strategy: Strategy::Malleable,
            modulus_bits: 1024,
        };
        let mut rng = seeded_rng();
        (
            parameters.generate_key_pair(&mut rng).unwrap(),
            parameters.generate_key_pair(&mut rng).unwrap(),
        )
    })
}

/// The three parties of one session, plus the auditor's key pair.
pub struct Session {
    pub params: PublicParameters,
    pub hub: hub::Config,
    pub receiver: receiver::Config,
    pub sender: sender::Config,
    pub auditor: EncryptionKeyPair,
}

pub fn session(rng: &mut (impl rand::CryptoRng + rand::RngCore), strategy: Strategy) -> Session {
    let (auditor, hub) = key_pairs();
    let hub_signing_key = SigningKey::new(rng);
    let params = PublicParameters::new(
        &Parameters {
            strategy,
            modulus_bits: 1024,
        },
        *Crs::global().unwrap(),
        PuzzleKeys {
            auditor: auditor.encryption_key().clone(),
            hub: hub.encryption_key().clone(),
        },
        hub_signing_key.verification_key(),
    )
    .unwrap();

    Session {
        hub: hub::Config::new(params.clone(), hub_signing_key, hub.clone()).unwrap(),
        receiver: receiver::Config::new(params.clone()),
        sender: sender::Config::new(params.clone(), SigningKey::new(rng)),
        auditor: auditor.clone(),
        params,
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
    fn record_str(&mut self, field: &field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

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
