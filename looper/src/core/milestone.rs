//! Completion-ratio milestone math.

/// Thresholds logged at most once per session, in percent.
pub const THRESHOLDS: [u8; 4] = [25, 50, 75, 100];

/// Integer completion percentage; 0 for an empty task list.
pub fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed * 100) / total) as u8
}

/// Thresholds reached at `percent` that have not been logged yet.
pub fn crossed(percent: u8, already: &[u8]) -> Vec<u8> {
    THRESHOLDS
        .iter()
        .copied()
        .filter(|threshold| *threshold <= percent && !already.contains(threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_zero_percent() {
        assert_eq!(completion_percent(0, 0), 0);
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 4), 50);
        assert_eq!(completion_percent(4, 4), 100);
    }

    #[test]
    fn crossed_skips_already_logged_thresholds() {
        assert_eq!(crossed(50, &[]), vec![25, 50]);
        assert_eq!(crossed(50, &[25]), vec![50]);
        assert_eq!(crossed(100, &[25, 50, 75, 100]), Vec::<u8>::new());
    }

    #[test]
    fn crossed_can_catch_up_multiple_thresholds_at_once() {
        assert_eq!(crossed(100, &[25]), vec![50, 75, 100]);
    }
}
