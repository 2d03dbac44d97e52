//! List numbering continuity.
//!
//! Each nesting level owns at most one active run. A run continues while the
//! items at its level keep the same `ordered` flag and nothing but deeper list
//! items of that same flag appears in between. A deeper sublist of the other
//! kind ends the run and so does any other block.
//!
//! A written start number only seeds the first ordered run of a document.
//! Every later run, whatever ended the one before it, counts from 1.

use std::collections::BTreeMap;

/// Number assigned to one list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListNumber {
    pub index: u32,
    pub group: u32,
}

#[derive(Debug, Clone, Copy)]
struct LevelCounter {
    ordered: bool,
    index: u32,
    group: u32,
}

#[derive(Debug, Default)]
pub struct ListNumbering {
    counters: BTreeMap<usize, LevelCounter>,
    numbering_group_id: u32,
    // An ordered run has been opened, so written starts no longer apply
    ordered_run_seen: bool,
}

impl ListNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number the next item at `level`, starting a new run at 1 if needed.
    pub fn next_index(&mut self, level: usize, ordered: bool) -> ListNumber {
        self.next_index_from(level, ordered, 1)
    }

    /// Like [`next_index`](Self::next_index), but the document's first
    /// ordered run starts at `start`. Ignored for every other item.
    pub fn next_index_from(&mut self, level: usize, ordered: bool, start: u32) -> ListNumber {
        let crossed_other_kind = self
            .counters
            .range(level + 1..)
            .any(|(_, deeper)| deeper.ordered != ordered);
        // A shallower item ends every deeper run.
        self.reset(level + 1);

        if let Some(counter) = self.counters.get_mut(&level) {
            if counter.ordered == ordered && !crossed_other_kind {
                counter.index += 1;
                return ListNumber {
                    index: counter.index,
                    group: counter.group,
                };
            }
        }

        self.numbering_group_id += 1;
        let index = if ordered && !self.ordered_run_seen {
            start.max(1)
        } else {
            1
        };
        self.ordered_run_seen |= ordered;
        let counter = LevelCounter {
            ordered,
            index,
            group: self.numbering_group_id,
        };
        self.counters.insert(level, counter);
        ListNumber {
            index: counter.index,
            group: counter.group,
        }
    }

    /// Forget the runs at `level` and every deeper level.
    pub fn reset(&mut self, level: usize) {
        self.counters.retain(|&active, _| active < level);
    }

    /// Called for every emitted block that is not a list item.
    pub fn on_non_list_block(&mut self) {
        if !self.counters.is_empty() {
            log::trace!("list interrupted, restarting numbering");
        }
        self.counters.clear();
        self.numbering_group_id += 1;
    }
}
