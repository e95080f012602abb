use super::{ReadCycleSource, ResponseToken, WriteCycleSource};

/// Pairs a read-cycle source and a write-cycle source behind the CPU-side
/// contract described in §4.1: drain writes, wait for a read address,
/// drain writes again (some arrive while blocked), respond.
pub struct BusEngine<R, W> {
    pub reads: R,
    pub writes: W,
}

impl<R: ReadCycleSource, W: WriteCycleSource> BusEngine<R, W> {
    pub fn new(reads: R, writes: W) -> Self {
        Self { reads, writes }
    }
}

/// Service one read cycle using loop Template A (banked mappers, §4.3):
/// drain writes, block for an address, drain writes again, translate,
/// respond. `apply_write` updates mapper/device state from a captured
/// write; `translate` computes the response token for a captured address.
///
/// This is the "drain writes twice" pattern: bank-register updates from
/// writes that raced the address capture must still be visible to this
/// cycle's translation (§5 ordering guarantees, §8.1 invariant 3).
pub fn service_read_cycle<R, W>(
    engine: &mut BusEngine<R, W>,
    mut apply_write: impl FnMut(u16, u8),
    mut translate: impl FnMut(u16) -> ResponseToken,
) -> u16
where
    R: ReadCycleSource,
    W: WriteCycleSource,
{
    engine.writes.drain_writes(&mut apply_write);
    let addr = engine.reads.next_address();
    engine.writes.drain_writes(&mut apply_write);
    let token = translate(addr);
    engine.reads.respond(token);
    addr
}

/// Service one read cycle using loop Template B (plain/linear ROM, §4.3):
/// no write draining, since a plain mapper has no bank registers for a
/// write to update.
pub fn service_plain_read_cycle<R, W>(
    engine: &mut BusEngine<R, W>,
    mut translate: impl FnMut(u16) -> ResponseToken,
) -> u16
where
    R: ReadCycleSource,
    W: WriteCycleSource,
{
    let addr = engine.reads.next_address();
    let token = translate(addr);
    engine.reads.respond(token);
    addr
}

#[cfg(test)]
pub mod test_support {
    //! A software double for the PIO FIFOs, used by every crate's unit
    //! tests to drive [`BusEngine`] without hardware. Reads and writes are
    //! scripted in advance and consumed in order, matching how the PIO
    //! FIFOs present captured cycles.

    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct ScriptedReads {
        pub pending: VecDeque<u16>,
        pub responses: Vec<ResponseToken>,
    }

    impl ReadCycleSource for ScriptedReads {
        fn next_address(&mut self) -> u16 {
            self.pending
                .pop_front()
                .expect("test script exhausted: no more read cycles queued")
        }

        fn respond(&mut self, token: ResponseToken) {
            self.responses.push(token);
        }
    }

    #[derive(Default)]
    pub struct ScriptedWrites {
        pub pending: VecDeque<(u16, u8)>,
    }

    impl WriteCycleSource for ScriptedWrites {
        fn try_pop_write(&mut self) -> Option<(u16, u8)> {
            self.pending.pop_front()
        }
    }

    /// Interleave reads and writes the way a real Z80 sequence would:
    /// `events` is a list of either a read address or a write, queued in
    /// program order, and each read consumes whatever writes were queued
    /// ahead of it in the script.
    pub enum Event {
        Read(u16),
        Write(u16, u8),
    }

    pub fn run_script(
        events: &[Event],
        mut apply_write: impl FnMut(u16, u8),
        mut translate: impl FnMut(u16) -> ResponseToken,
    ) -> Vec<ResponseToken> {
        let mut engine = BusEngine::new(ScriptedReads::default(), ScriptedWrites::default());
        for ev in events {
            match ev {
                Event::Read(addr) => {
                    engine.reads.pending.push_back(*addr);
                    service_read_cycle(&mut engine, &mut apply_write, &mut translate);
                }
                Event::Write(addr, data) => {
                    engine.writes.pending.push_back((*addr, *data));
                }
            }
        }
        engine.reads.responses
    }
}
