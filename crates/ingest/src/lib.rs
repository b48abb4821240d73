//! Harvest ingest layer
//!
//! This is where a stem-count submission enters the system. A field form or
//! QR link hands us strings; we hand back a [`CanonicalRecord`] or a typed
//! [`ValidationError`].
//!
//! ## What we do here
//!
//! - **Require the essentials** - id, variety, block and stem count must be
//!   present and non-blank.
//! - **Coerce numbers** - the stem count must be a whole number ≥ 1; the block
//!   must be numeric when a store demands it.
//! - **Resolve the size** - national records never carry one; otherwise the
//!   submitted size survives only if the [`SizeRulebook`] allows it and it is
//!   not the `na` pseudo-size. Anything else is dropped, not rejected.
//! - **Stamp the day** - the record date comes from the injected [`Clock`].
//! - **Log everything** - structured `tracing` events on success and failure.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ingest::{normalize, FixedClock, IngestConfig, RawSubmission, RecordType, SizeCode};
//!
//! let raw = RawSubmission {
//!     id: Some("QR-42".into()),
//!     variety: Some("Freedom".into()),
//!     size: Some(" LARGO ".into()),
//!     stem_count: Some("25".into()),
//!     block: Some("3".into()),
//!     record_type: Some("end_of_cut".into()),
//!     ..Default::default()
//! };
//! let today = FixedClock(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
//!
//! let record = normalize(raw, &IngestConfig::default(), &today).unwrap();
//! assert_eq!(record.size(), Some(SizeCode::Largo));
//! assert_eq!(record.record_type(), RecordType::EndOfCut);
//! assert_eq!(record.stem_count().get(), 25);
//! ```
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn, Level};

mod clock;
mod config;
mod error;
mod fields;
mod types;

use crate::fields::{sanitize_optional, sanitize_required};

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::{Field, ValidationError};
pub use crate::types::{
    parse_force_flag, BlockCode, CanonicalRecord, RawSubmission, RecordType, StemCount,
};
pub use rulebook::{SizeCode, SizeRulebook};

/// Normalizes with the standard size table.
pub fn normalize(
    raw: RawSubmission,
    cfg: &IngestConfig,
    clock: &dyn Clock,
) -> Result<CanonicalRecord, ValidationError> {
    normalize_with_rules(raw, cfg, &SizeRulebook::standard(), clock)
}

/// Turns a raw submission into a canonical record, or says why it cannot.
pub fn normalize_with_rules(
    raw: RawSubmission,
    cfg: &IngestConfig,
    rules: &SizeRulebook,
    clock: &dyn Clock,
) -> Result<CanonicalRecord, ValidationError> {
    let start = Instant::now();
    let id_hint = raw.id.clone();

    let span = tracing::span!(Level::DEBUG, "ingest.normalize", record_id = ?id_hint);
    let _guard = span.enter();

    match normalize_inner(raw, cfg, rules, clock) {
        Ok(record) => {
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                record_id = %record.id(),
                block = %record.block(),
                variety = %record.variety(),
                record_type = %record.record_type(),
                size = ?record.size(),
                elapsed_micros,
                "normalize_success"
            );
            Ok(record)
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(
                record_id = ?id_hint,
                error = %err,
                code = err.code(),
                elapsed_micros,
                "normalize_failure"
            );
            Err(err)
        }
    }
}

fn normalize_inner(
    raw: RawSubmission,
    cfg: &IngestConfig,
    rules: &SizeRulebook,
    clock: &dyn Clock,
) -> Result<CanonicalRecord, ValidationError> {
    let RawSubmission {
        id,
        variety,
        size,
        stem_count,
        stage,
        block,
        record_type,
        force: _,
    } = raw;

    // Required fields are checked in form order so the first gap is reported.
    let id = match sanitize_optional(Field::Id, id, cfg)? {
        Some(id) => id,
        None if cfg.generate_missing_id => {
            let generated = uuid::Uuid::new_v4().to_string();
            debug!(record_id = %generated, "generated missing record id");
            generated
        }
        None => return Err(ValidationError::MissingField(Field::Id)),
    };
    let variety = sanitize_required(Field::Variety, variety, cfg)?;
    let block = BlockCode::new(sanitize_required(Field::Block, block, cfg)?);
    let stem_count = sanitize_required(Field::StemCount, stem_count, cfg)?;
    let stem_count = StemCount::parse(&stem_count)?;

    if cfg.numeric_block && !block.is_numeric() {
        return Err(ValidationError::InvalidBlock(block.as_str().to_string()));
    }

    let record_type = resolve_record_type(record_type.as_deref());
    let size = resolve_size(rules, &variety, &block, record_type, size.as_deref());
    let stage = sanitize_optional(Field::Stage, stage, cfg)?.unwrap_or_default();

    Ok(CanonicalRecord::from_parts(
        id,
        clock.today(),
        block,
        variety,
        stem_count,
        stage,
        record_type,
        size,
    ))
}

/// Unknown or missing labels fall back to end-of-cut so size rules still run.
fn resolve_record_type(label: Option<&str>) -> RecordType {
    match label.and_then(RecordType::from_label) {
        Some(record_type) => record_type,
        None => {
            debug!(label = ?label, "unrecognised record type, treating as end_of_cut");
            RecordType::EndOfCut
        }
    }
}

/// The size a record keeps, if any. Never an error: illegal sizes are dropped.
fn resolve_size(
    rules: &SizeRulebook,
    variety: &str,
    block: &BlockCode,
    record_type: RecordType,
    raw_size: Option<&str>,
) -> Option<SizeCode> {
    if record_type.is_national() {
        return None;
    }
    let raw_size = raw_size?.trim();
    if raw_size.is_empty() {
        return None;
    }
    if !rules.is_allowed(variety, block.as_str(), raw_size) {
        debug!(
            variety,
            block = %block,
            size = raw_size,
            "size not allowed for variety/block, dropping"
        );
        return None;
    }
    SizeCode::parse_lenient(raw_size).filter(|code| !code.is_pseudo())
}

/// A configured normalizer: config, size table and clock bundled together.
#[derive(Clone)]
pub struct RecordNormalizer {
    config: IngestConfig,
    rules: SizeRulebook,
    clock: Arc<dyn Clock>,
}

impl RecordNormalizer {
    /// Validates `config` and reads days from the wall clock in its offset.
    pub fn new(config: IngestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = SystemClock::from_config(&config)?;
        Ok(Self {
            config,
            rules: SizeRulebook::standard(),
            clock: Arc::new(clock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rules(mut self, rules: SizeRulebook) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn rules(&self) -> &SizeRulebook {
        &self.rules
    }

    pub fn normalize(&self, raw: RawSubmission) -> Result<CanonicalRecord, ValidationError> {
        normalize_with_rules(raw, &self.config, &self.rules, self.clock.as_ref())
    }
}

impl std::fmt::Debug for RecordNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordNormalizer")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
