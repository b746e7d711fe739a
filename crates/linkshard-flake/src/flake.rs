use crate::clock::{Clock, SystemClock};
use crate::flake_id::{FlakeId, NODE_ID_BITS, TICK_BITS};
use crate::Error;
use async_trait::async_trait;
use jiff::Timestamp;
use linkshard_core::IdAllocator;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

const MAX_TICKS: i64 = (1_i64 << TICK_BITS) - 1;
const MAX_NODE_ID: u8 = (1 << NODE_ID_BITS) - 1;
const MAX_SEQUENCE: u8 = u8::MAX;

/// Configures a Flake allocator instance.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct FlakeSettings {
    /// A unique node index in the range `[0, 7]`.
    ///
    /// Two allocators sharing a node id can mint the same ids. Nothing
    /// detects this; each process must be given its own id.
    pub node_id: u8,
    /// Custom epoch used as the zero point for the 30-bit tick field.
    pub start_epoch: Timestamp,
    /// Length of one tick. Sub-millisecond values are rounded up to 1 ms.
    ///
    /// With the default of one second the tick field lasts about 34 years.
    #[builder(default = Duration::from_secs(1))]
    pub tick: Duration,
    /// Longest a call may wait for a clock that moved backwards.
    #[builder(default = Duration::from_secs(2))]
    pub max_wait: Duration,
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_tick: Option<i64>,
    sequence: u8,
}

/// Flake ID allocator with wait-on-overflow semantics.
///
/// Ids are ordered by time: an id minted in a later tick is always larger.
pub struct Flake<C: Clock = SystemClock> {
    start_time: Timestamp,
    node_id: u8,
    tick_ms: i64,
    max_wait: Duration,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl Flake<SystemClock> {
    /// Creates an allocator backed by the real system clock.
    pub fn new(settings: FlakeSettings) -> Result<Self, Error> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Flake<C> {
    pub(crate) fn with_clock(settings: FlakeSettings, clock: C) -> Result<Self, Error> {
        if settings.node_id > MAX_NODE_ID {
            return Err(Error::InvalidNodeId {
                node_id: settings.node_id,
                max_node_id: MAX_NODE_ID,
            });
        }

        let now = clock.now();
        if settings.start_epoch > now {
            return Err(Error::EpochAhead {
                epoch: settings.start_epoch,
                now,
            });
        }

        let tick_ms = i64::try_from(settings.tick.as_millis())
            .unwrap_or(i64::MAX)
            .max(1);

        Ok(Self {
            start_time: settings.start_epoch,
            node_id: settings.node_id,
            tick_ms,
            max_wait: settings.max_wait,
            clock,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    fn tick_of(&self, at: Timestamp) -> i64 {
        (at.as_millisecond() - self.start_time.as_millisecond()).div_euclid(self.tick_ms)
    }

    fn tick_start(&self, tick: i64) -> Result<Timestamp, Error> {
        let millis = self
            .start_time
            .as_millisecond()
            .saturating_add(tick.saturating_mul(self.tick_ms));
        Timestamp::from_millisecond(millis).map_err(|_| Error::OverTimeLimit)
    }

    /// Allocates the next unique id.
    ///
    /// - if the per-tick sequence is exhausted, wait for the next tick
    /// - if the clock moved backward, wait until it catches up, but no longer
    ///   than `max_wait`
    pub async fn next_id(&self) -> Result<FlakeId, Error> {
        let mut state = self.state.lock().await;

        let mut now = self.clock.now();
        let mut tick = self.tick_of(now);

        match state.last_tick {
            None => {
                if tick < 0 {
                    return Err(Error::EpochAhead {
                        epoch: self.start_time,
                        now,
                    });
                }
                state.sequence = 0;
            }
            Some(last) => {
                if tick < last {
                    // Without waiting, two calls could produce the same
                    // (tick, sequence, node_id) triple.
                    let resume_at = self.tick_start(last)?;
                    let drift = Duration::try_from(resume_at.duration_since(now)).unwrap_or_default();
                    if drift > self.max_wait {
                        warn!(?drift, "clock moved backwards beyond the allowed wait");
                        return Err(Error::ClockMovedBackwards { drift });
                    }
                    debug!(?drift, "clock moved backwards, waiting to catch up");
                    self.clock.wait_until(resume_at).await;
                    now = self.clock.now();
                    tick = self.tick_of(now).max(last);
                }

                if tick == last {
                    if state.sequence < MAX_SEQUENCE {
                        state.sequence += 1;
                    } else {
                        // Sequence exhausted: start fresh in the next tick.
                        let next_tick = self.tick_start(last + 1)?;
                        self.clock.wait_until(next_tick).await;
                        tick = self.tick_of(self.clock.now()).max(last + 1);
                        state.sequence = 0;
                    }
                } else {
                    state.sequence = 0;
                }
            }
        }

        if tick > MAX_TICKS {
            return Err(Error::OverTimeLimit);
        }

        let id = FlakeId::new()
            .with_ticks(tick as u32)
            .with_sequence(state.sequence)
            .with_node_id(self.node_id);

        state.last_tick = Some(tick);

        Ok(id)
    }
}

#[async_trait]
impl<C: Clock> IdAllocator for Flake<C> {
    async fn allocate(&self) -> Result<u64, Error> {
        self.next_id().await.map(u64::from)
    }
}
