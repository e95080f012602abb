use core::cell::UnsafeCell;

/// The 512-byte ATA sector buffer, shared between core 0 (Z80-facing byte
/// latch, §4.5.4) and core 1 (USB completion callbacks, §4.6) without a
/// lock. Safety rests entirely on the IDE state machine: core 1 only
/// touches the buffer while the FSM is `Busy` with a transfer in flight,
/// core 0 only touches it while `ReadData`/`WriteData`, and the two never
/// overlap for a given sector (§5 "Shared resources").
pub struct SharedSectorBuffer(UnsafeCell<[u8; 512]>);

// SAFETY: access is serialized by the IDE FSM, not by the type system;
// see the struct doc comment. Both cores only ever run on the same chip
// sharing the same memory map, so no cross-device aliasing is possible.
unsafe impl Sync for SharedSectorBuffer {}

impl SharedSectorBuffer {
    pub const fn new() -> Self {
        Self(UnsafeCell::new([0u8; 512]))
    }

    /// # Safety
    /// Caller must hold whichever core's turn it is per the FSM state, as
    /// described on [`SharedSectorBuffer`].
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice(&self) -> &mut [u8; 512] {
        unsafe { &mut *self.0.get() }
    }

    /// # Safety
    /// Same discipline as [`SharedSectorBuffer::as_mut_slice`].
    pub unsafe fn as_slice(&self) -> &[u8; 512] {
        unsafe { &*self.0.get() }
    }
}

impl Default for SharedSectorBuffer {
    fn default() -> Self {
        Self::new()
    }
}
