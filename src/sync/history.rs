use crate::locator::candidate::SelectorOption;

pub const HISTORY_CAPACITY: usize = 50;

/// Push a freshly captured locator to the front of `history`.
///
/// Skipped when the current top entry already has the same value. Returns
/// whether the history changed.
pub fn record_capture(history: &mut Vec<SelectorOption>, entry: SelectorOption, capacity: usize) -> bool {
    if history.first().is_some_and(|top| top.value == entry.value) {
        return false;
    }
    history.insert(0, entry);
    history.truncate(capacity);
    true
}

/// Replace the newest entry with the option the user re-ranked to.
///
/// Assumes the user is refining the latest capture; it never touches older
/// entries.
pub fn refine_latest(history: &mut Vec<SelectorOption>, entry: SelectorOption) -> bool {
    match history.first_mut() {
        Some(top) if *top == entry => false,
        Some(top) => {
            *top = entry;
            true
        }
        None => {
            history.push(entry);
            true
        }
    }
}
