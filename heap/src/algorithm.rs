//! Placement policy selection.

/// Which free block a placement search prefers.
///
/// The discriminants are pinned to the values the original tool used for its
/// `initialize` argument, in case a caller is porting numeric configuration
/// from that era.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Return the first free block encountered that fits.
    FirstFit = 0,
    /// Resume scanning from where the previous search left off.
    NextFit = 1,
    /// Scan every free block and return the smallest one that fits.
    BestFit = 2,
}
