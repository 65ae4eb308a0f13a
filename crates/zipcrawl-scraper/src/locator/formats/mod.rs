//! Site-specific locator sources.

mod carecredit;
mod wellsfargo;

pub use carecredit::CareCreditSource;
pub use wellsfargo::WellsFargoSource;

/// Collapses runs of whitespace and trims the ends.
pub(super) fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
