//! Component B — the PIO bus engine's CPU-side contract.
//!
//! The PIO state machines (read responder, write captor; §4.1) do the part
//! of the Z80 bus cycle that has to happen in nanoseconds. Everything here
//! is the part the CPU does once a cycle has already been stretched by
//! /WAIT: pull an address out of the read FIFO, drain any writes that
//! arrived alongside it, and push back a response token. [`ReadCycleSource`]
//! and [`WriteCycleSource`] are the seams a concrete PIO binding (in the
//! `firmware` crate) implements; everything below them is hardware-agnostic
//! and runs the same way against a software FIFO double in tests.

mod engine;
mod token;

pub use engine::{BusEngine, service_plain_read_cycle, service_read_cycle};
pub use token::ResponseToken;

/// Source of captured read-cycle addresses and sink for response tokens.
///
/// A single read cycle is: block for an address, do work, push exactly one
/// token. The PIO read-responder SM enforces the "exactly one token per
/// cycle" half of that by blocking its own TX FIFO pull (§8.1 invariant 2);
/// this trait's contract is that `respond` must be called before the next
/// `next_address` call can return the *following* cycle's address — true
/// of both the real PIO FIFO and the software double used in tests.
pub trait ReadCycleSource {
    /// Block until a read cycle's address has been captured, then return it.
    fn next_address(&mut self) -> u16;

    /// Supply the response token for the most recently returned address.
    fn respond(&mut self, token: ResponseToken);
}

/// Source of captured write-cycle (address, data) pairs.
///
/// Writes must be drained in the order the Z80 issued them (§5, "ordering
/// guarantees"); implementations are a FIFO, not a set.
pub trait WriteCycleSource {
    /// Pop the next captured write, if any, without blocking.
    fn try_pop_write(&mut self) -> Option<(u16, u8)>;

    /// Drain every currently queued write, applying `apply` to each in order.
    fn drain_writes(&mut self, mut apply: impl FnMut(u16, u8)) {
        while let Some((addr, data)) = self.try_pop_write() {
            apply(addr, data);
        }
    }
}

impl<T: ReadCycleSource + ?Sized> ReadCycleSource for &mut T {
    fn next_address(&mut self) -> u16 {
        (**self).next_address()
    }

    fn respond(&mut self, token: ResponseToken) {
        (**self).respond(token)
    }
}

impl<T: WriteCycleSource + ?Sized> WriteCycleSource for &mut T {
    fn try_pop_write(&mut self) -> Option<(u16, u8)> {
        (**self).try_pop_write()
    }
}
