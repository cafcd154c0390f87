//! Cursors of cursor-based VM selection policies.

use crate::error::PlacementError;

/// Persistent state of NextFit and RoundRobin policies.
///
/// Holds the index of the last selected VM for each edge host and the index of the last selected host for
/// the load-balanced mode. `None` means "before the first element", so the next scan starts at index 0.
/// The state is created once when the orchestrator is initialized and is never reset during the simulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    last_vm_indexes: Vec<Option<usize>>,
    last_host_index: Option<usize>,
}

impl SelectionState {
    pub fn new(host_count: usize) -> Self {
        Self {
            last_vm_indexes: vec![None; host_count],
            last_host_index: None,
        }
    }

    pub fn host_count(&self) -> usize {
        self.last_vm_indexes.len()
    }

    /// Returns the VM cursor of the host.
    pub fn last_vm_index(&self, host: usize) -> Result<Option<usize>, PlacementError> {
        self.last_vm_indexes
            .get(host)
            .copied()
            .ok_or_else(|| unknown_host(host, self.host_count()))
    }

    pub fn set_last_vm_index(&mut self, host: usize, index: usize) -> Result<(), PlacementError> {
        let host_count = self.host_count();
        let cursor = self
            .last_vm_indexes
            .get_mut(host)
            .ok_or_else(|| unknown_host(host, host_count))?;
        *cursor = Some(index);
        Ok(())
    }

    pub fn last_host_index(&self) -> Option<usize> {
        self.last_host_index
    }

    pub fn set_last_host_index(&mut self, index: usize) {
        self.last_host_index = Some(index);
    }
}

/// Returns the index following `cursor` in a circular list of `len` elements.
///
/// The cursor may be left over from a longer list, the result is always a valid index for non-empty list.
pub fn next_index(cursor: Option<usize>, len: usize) -> usize {
    debug_assert!(len > 0);
    match cursor {
        Some(index) => index.wrapping_add(1) % len,
        None => 0,
    }
}

fn unknown_host(host: usize, host_count: usize) -> PlacementError {
    PlacementError::InvalidState(format!(
        "no cursor for host {} (state is initialized for {} hosts)",
        host, host_count
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_index_wraps() {
        assert_eq!(next_index(None, 3), 0);
        assert_eq!(next_index(Some(0), 3), 1);
        assert_eq!(next_index(Some(2), 3), 0);
        // cursor left over from a longer list
        assert_eq!(next_index(Some(7), 3), 2);
    }

    #[test]
    fn unknown_host_is_invalid_state() {
        let mut state = SelectionState::new(2);
        assert_eq!(state.last_vm_index(1), Ok(None));
        assert!(matches!(state.last_vm_index(2), Err(PlacementError::InvalidState(_))));
        assert!(state.set_last_vm_index(5, 0).is_err());
        state.set_last_vm_index(1, 4).unwrap();
        assert_eq!(state.last_vm_index(1), Ok(Some(4)));
    }
}
