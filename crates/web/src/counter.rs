//! Counter state rules shared by the server render and the client island

/// Count the page starts with
pub const INITIAL_COUNT: i64 = 3;

/// Lowest count the counter ever shows
pub const MIN_COUNT: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    count: i64,
}

impl Counter {
    /// Wrap a raw value. It may be below the floor until `normalize` runs,
    /// the same way an update from elsewhere would be.
    pub fn new(count: i64) -> Self {
        Self { count }
    }

    pub fn value(&self) -> i64 {
        self.count
    }

    pub fn set(&mut self, count: i64) {
        self.count = count;
    }

    pub fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Step down, never below `MIN_COUNT`
    pub fn decrement(&mut self) {
        self.count = MIN_COUNT.max(self.count.saturating_sub(1));
    }

    /// Self-correcting effect: pull anything below the floor back up.
    /// Returns the document title for the corrected value.
    pub fn normalize(&mut self) -> String {
        if self.count < MIN_COUNT {
            self.count = MIN_COUNT;
        }
        self.title()
    }

    pub fn title(&self) -> String {
        title_for(self.count)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new(INITIAL_COUNT)
    }
}

/// `"<n> Fresh Counter"`, pluralised unless `|n| == 1`
pub fn title_for(count: i64) -> String {
    let suffix = if count.unsigned_abs() == 1 { "" } else { "s" };
    format!("{} Fresh Counter{}", count, suffix)
}
