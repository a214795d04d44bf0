/// Returns the index (0-63) of the most significant set bit in a
/// directory word, or `None` if the word is zero.
#[inline(always)]
pub fn most_significant_bit(word: u64) -> Option<u32> {
    if word == 0 {
        return None;
    }
    Some(63 - word.leading_zeros())
}

/// Returns the index (0-63) of the least significant set bit in a
/// directory word, or `None` if the word is zero.
#[inline(always)]
pub fn least_significant_bit(word: u64) -> Option<u32> {
    if word == 0 {
        return None;
    }
    Some(word.trailing_zeros())
}
