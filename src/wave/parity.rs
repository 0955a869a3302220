//! Two-slot arena with a parity bit selecting the current slot.

/// Exactly two owned values used in strict alternation.
///
/// The current slot holds the most recently completed state; the other slot
/// is the write target of the next step. `advance` flips the roles.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    active_is_a: bool,
}

/// Which physical slot a role currently maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }

    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

impl<T> PingPong<T> {
    /// Slot `a` starts as current
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            active_is_a: true,
        }
    }

    pub fn current_slot(&self) -> Slot {
        if self.active_is_a {
            Slot::A
        } else {
            Slot::B
        }
    }

    pub fn previous_slot(&self) -> Slot {
        self.current_slot().other()
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current_slot().index()]
    }

    pub fn previous(&self) -> &T {
        &self.slots[self.previous_slot().index()]
    }

    pub fn get(&self, slot: Slot) -> &T {
        &self.slots[slot.index()]
    }

    /// Read access to the current slot alongside write access to the other one
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        if self.active_is_a {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Flip roles once the write target holds a complete state
    pub fn advance(&mut self) {
        self.active_is_a = !self.active_is_a;
    }
}
