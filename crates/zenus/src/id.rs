//! # Block Identifiers
//!
//! New blocks get snowflake-style ids:
//!
//! ```text
//! | 41 bits: ms since 2024-01-01 | 10 bits: machine | 12 bits: sequence |
//! ```
//!
//! rendered as 20-digit zero-padded decimal strings, so string order and
//! numeric order agree and later ids always sort after earlier ones.
//!
//! ## Never Blocking
//!
//! A classic snowflake generator sleeps when the 4096 ids of a millisecond are
//! used up, or errors when the clock runs backwards. This one keeps its own
//! logical millisecond instead: when the wall clock lags behind, the logical
//! clock advances by one and the sequence restarts. Generation cannot fail.

use chrono::Utc;

use crate::model::BlockId;

/// 2024-01-01T00:00:00Z in Unix milliseconds.
const EPOCH_MS: i64 = 1_704_067_200_000;
const MACHINE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_MACHINE: u16 = (1 << MACHINE_BITS) - 1;
const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

type Clock = Box<dyn FnMut() -> i64 + Send>;

pub struct IdGenerator {
    machine_id: u16,
    clock: Clock,
    last_ms: i64,
    sequence: u16,
}

impl IdGenerator {
    /// Creates a generator reading the system clock. Only the low 10 bits of
    /// `machine_id` are used.
    pub fn new(machine_id: u16) -> Self {
        Self::with_clock(machine_id, || Utc::now().timestamp_millis())
    }

    /// Creates a generator over a custom Unix-millisecond clock.
    pub fn with_clock(machine_id: u16, clock: impl FnMut() -> i64 + Send + 'static) -> Self {
        Self {
            machine_id: machine_id & MAX_MACHINE,
            clock: Box::new(clock),
            last_ms: -1,
            sequence: 0,
        }
    }

    pub fn generate(&mut self) -> BlockId {
        let now = ((self.clock)() - EPOCH_MS).max(0);

        if now > self.last_ms {
            self.last_ms = now;
            self.sequence = 0;
        } else if self.sequence < MAX_SEQUENCE {
            self.sequence += 1;
        } else {
            self.last_ms += 1;
            self.sequence = 0;
        }

        let raw = ((self.last_ms as u64 & TIMESTAMP_MASK) << (MACHINE_BITS + SEQUENCE_BITS))
            | (u64::from(self.machine_id) << SEQUENCE_BITS)
            | u64::from(self.sequence);
        BlockId::new(format!("{:020}", raw))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}
