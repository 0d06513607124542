/// Last URL seen by the in-app navigation detector.
///
/// Created once at boot with the initial URL. The detector calls
/// [`NavigationTracker::observe`] whenever the page might have navigated;
/// a different URL resets the tracker and asks for a re-dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTracker {
    current: String,
}

impl NavigationTracker {
    #[must_use]
    pub fn init(url: &str) -> Self {
        Self {
            current: url.to_string(),
        }
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Returns `true` if `url` differs from the last seen URL, in which case
    /// the tracker now holds `url`.
    pub fn observe(&mut self, url: &str) -> bool {
        if self.current == url {
            return false;
        }
        self.reset(url);
        true
    }

    pub fn reset(&mut self, url: &str) {
        url.clone_into(&mut self.current);
    }
}
