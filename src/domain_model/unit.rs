use serde::Deserialize;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize)]
pub struct PageSize(pub u16);

impl PageSize {
    pub const MAX: PageSize = PageSize(200);

    /// Zero or oversized pages collapse into `1..=MAX`.
    pub fn clamped(self) -> PageSize {
        PageSize(self.0.clamp(1, Self::MAX.0))
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(50)
    }
}
