use crate::math::bit_math::{least_significant_bit, most_significant_bit};
use crate::math::tick_math::MAX_TICK;
use crate::pool::rewarder::REWARDER_NUM;
use crate::FastMap;

/// Ticks are grouped into fixed-size bit vectors; one group tracks
/// 1000 consecutive spacing-aligned tick slots.
pub const TICK_GROUP_SIZE: i64 = 1000;

const WORDS_PER_GROUP: usize = 16;

/// Bookkeeping for one initialized tick. Created when the first
/// position uses the tick as a boundary, destroyed when the last one
/// leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub index: i32,
    pub sqrt_price: u128,
    /// Added to the active liquidity when the price crosses this tick
    /// moving up, subtracted moving down.
    pub liquidity_net: i128,
    /// Total liquidity of all positions bounded by this tick; a zero
    /// value means the record can be dropped.
    pub liquidity_gross: u128,
    pub fee_growth_outside_a: u128,
    pub fee_growth_outside_b: u128,
    pub rewarder_growth_outside: [u128; REWARDER_NUM],
}

impl Tick {
    pub(crate) fn new(index: i32, sqrt_price: u128) -> Self {
        Self {
            index,
            sqrt_price,
            liquidity_net: 0,
            liquidity_gross: 0,
            fee_growth_outside_a: 0,
            fee_growth_outside_b: 0,
            rewarder_growth_outside: [0; REWARDER_NUM],
        }
    }

    /// A fresh tick at or below the current tick starts with the full
    /// global growth attributed to its lower side; above, with zero.
    pub(crate) fn seed(
        &mut self,
        tick_current: i32,
        fee_growth_global_a: u128,
        fee_growth_global_b: u128,
        rewarder_growth_global: &[u128; REWARDER_NUM],
    ) {
        if tick_current >= self.index {
            self.fee_growth_outside_a = fee_growth_global_a;
            self.fee_growth_outside_b = fee_growth_global_b;
            self.rewarder_growth_outside = *rewarder_growth_global;
        }
    }

    /// Flips every "outside" accumulator to the other side of the tick
    /// as the price crosses it. Wrapping by design of the growth
    /// arithmetic.
    pub(crate) fn cross(
        &mut self,
        fee_growth_global_a: u128,
        fee_growth_global_b: u128,
        rewarder_growth_global: &[u128; REWARDER_NUM],
    ) {
        self.fee_growth_outside_a = fee_growth_global_a.wrapping_sub(self.fee_growth_outside_a);
        self.fee_growth_outside_b = fee_growth_global_b.wrapping_sub(self.fee_growth_outside_b);
        for (outside, global) in self
            .rewarder_growth_outside
            .iter_mut()
            .zip(rewarder_growth_global)
        {
            *outside = global.wrapping_sub(*outside);
        }
    }
}

fn outside_or_seed(outside: Option<u128>, index: i32, tick_current: i32, global: u128) -> u128 {
    match outside {
        Some(value) => value,
        None if tick_current >= index => global,
        None => 0,
    }
}

fn growth_below(outside: u128, index: i32, tick_current: i32, global: u128) -> u128 {
    if tick_current >= index {
        outside
    } else {
        global.wrapping_sub(outside)
    }
}

fn growth_above(outside: u128, index: i32, tick_current: i32, global: u128) -> u128 {
    if tick_current < index {
        outside
    } else {
        global.wrapping_sub(outside)
    }
}

fn growth_inside(
    tick_current: i32,
    lower_index: i32,
    lower_outside: Option<u128>,
    upper_index: i32,
    upper_outside: Option<u128>,
    global: u128,
) -> u128 {
    let below = growth_below(
        outside_or_seed(lower_outside, lower_index, tick_current, global),
        lower_index,
        tick_current,
        global,
    );
    let above = growth_above(
        outside_or_seed(upper_outside, upper_index, tick_current, global),
        upper_index,
        tick_current,
        global,
    );
    global.wrapping_sub(below).wrapping_sub(above)
}

/// Fee growth accumulated per unit of liquidity strictly inside
/// `[lower, upper)`. Absent ticks are treated exactly as a fresh seed
/// would initialise them, so refreshing before and after tick creation
/// agrees.
pub(crate) fn fee_growth_inside(
    tick_current: i32,
    lower_index: i32,
    lower: Option<&Tick>,
    upper_index: i32,
    upper: Option<&Tick>,
    fee_growth_global_a: u128,
    fee_growth_global_b: u128,
) -> (u128, u128) {
    (
        growth_inside(
            tick_current,
            lower_index,
            lower.map(|t| t.fee_growth_outside_a),
            upper_index,
            upper.map(|t| t.fee_growth_outside_a),
            fee_growth_global_a,
        ),
        growth_inside(
            tick_current,
            lower_index,
            lower.map(|t| t.fee_growth_outside_b),
            upper_index,
            upper.map(|t| t.fee_growth_outside_b),
            fee_growth_global_b,
        ),
    )
}

/// Reward growth per unit of liquidity inside the range, one entry per
/// rewarder slot.
pub(crate) fn rewarder_growth_inside(
    tick_current: i32,
    lower_index: i32,
    lower: Option<&Tick>,
    upper_index: i32,
    upper: Option<&Tick>,
    rewarder_growth_global: &[u128; REWARDER_NUM],
) -> [u128; REWARDER_NUM] {
    let mut inside = [0u128; REWARDER_NUM];
    for (slot, value) in inside.iter_mut().enumerate() {
        *value = growth_inside(
            tick_current,
            lower_index,
            lower.map(|t| t.rewarder_growth_outside[slot]),
            upper_index,
            upper.map(|t| t.rewarder_growth_outside[slot]),
            rewarder_growth_global[slot],
        );
    }
    inside
}

/// Sparse index over the initialized ticks of one pool.
///
/// The aligned tick domain is shifted to start at offset zero and cut
/// into 1000-bit groups; a group exists only while it has a set bit.
/// `next_active` walks words with single bit-scan instructions, so a
/// swap pays O(1) per visited word.
#[derive(Debug, Clone)]
pub struct TickDirectory {
    tick_spacing: u32,
    min_aligned: i32,
    max_offset: i64,
    groups: FastMap<i64, [u64; WORDS_PER_GROUP]>,
}

impl TickDirectory {
    pub fn new(tick_spacing: u32) -> Self {
        let span = MAX_TICK / tick_spacing as i32;
        Self {
            tick_spacing,
            min_aligned: -span * tick_spacing as i32,
            max_offset: (span as i64) * 2,
            groups: FastMap::default(),
        }
    }

    fn offset_of(&self, tick: i32) -> i64 {
        (tick as i64 - self.min_aligned as i64) / self.tick_spacing as i64
    }

    // Offset of the greatest aligned tick at or below `tick`; may be
    // negative when `tick` sits below the aligned domain.
    fn floor_offset(&self, tick: i32) -> i64 {
        (tick as i64 - self.min_aligned as i64).div_euclid(self.tick_spacing as i64)
    }

    fn tick_at_offset(&self, offset: i64) -> i32 {
        self.min_aligned + (offset as i32) * self.tick_spacing as i32
    }

    pub fn mark(&mut self, tick: i32) {
        let offset = self.offset_of(tick);
        let words = self
            .groups
            .entry(offset / TICK_GROUP_SIZE)
            .or_insert([0; WORDS_PER_GROUP]);
        let bit = offset % TICK_GROUP_SIZE;
        words[(bit / 64) as usize] |= 1u64 << (bit % 64);
    }

    pub fn unmark(&mut self, tick: i32) {
        let offset = self.offset_of(tick);
        let group_index = offset / TICK_GROUP_SIZE;
        if let Some(words) = self.groups.get_mut(&group_index) {
            let bit = offset % TICK_GROUP_SIZE;
            words[(bit / 64) as usize] &= !(1u64 << (bit % 64));
            if words.iter().all(|w| *w == 0) {
                self.groups.remove(&group_index);
            }
        }
    }

    pub fn is_marked(&self, tick: i32) -> bool {
        let offset = self.offset_of(tick);
        match self.groups.get(&(offset / TICK_GROUP_SIZE)) {
            Some(words) => {
                let bit = offset % TICK_GROUP_SIZE;
                words[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
            }
            None => false,
        }
    }

    /// First initialized tick at or below `from` (downward direction),
    /// or strictly above `from` (upward), or `None` at the bound.
    pub fn next_active(&self, from: i32, a_to_b: bool) -> Option<i32> {
        if a_to_b {
            let start = self.floor_offset(from);
            if start < 0 {
                return None;
            }
            self.scan_down(start.min(self.max_offset))
        } else {
            let start = self.floor_offset(from) + 1;
            if start > self.max_offset {
                return None;
            }
            self.scan_up(start.max(0))
        }
    }

    fn scan_down(&self, start: i64) -> Option<i32> {
        let mut group_index = start / TICK_GROUP_SIZE;
        let mut bit = start % TICK_GROUP_SIZE;
        loop {
            if let Some(words) = self.groups.get(&group_index) {
                let mut word_index = (bit / 64) as usize;
                let mut mask = if bit % 64 == 63 {
                    u64::MAX
                } else {
                    (1u64 << (bit % 64 + 1)) - 1
                };
                loop {
                    if let Some(msb) = most_significant_bit(words[word_index] & mask) {
                        let offset =
                            group_index * TICK_GROUP_SIZE + (word_index as i64) * 64 + msb as i64;
                        return Some(self.tick_at_offset(offset));
                    }
                    if word_index == 0 {
                        break;
                    }
                    word_index -= 1;
                    mask = u64::MAX;
                }
            }
            if group_index == 0 {
                return None;
            }
            group_index -= 1;
            bit = TICK_GROUP_SIZE - 1;
        }
    }

    fn scan_up(&self, start: i64) -> Option<i32> {
        let max_group = self.max_offset / TICK_GROUP_SIZE;
        let mut group_index = start / TICK_GROUP_SIZE;
        let mut bit = start % TICK_GROUP_SIZE;
        while group_index <= max_group {
            if let Some(words) = self.groups.get(&group_index) {
                let mut word_index = (bit / 64) as usize;
                let mut mask = u64::MAX << (bit % 64);
                while word_index < WORDS_PER_GROUP {
                    if let Some(lsb) = least_significant_bit(words[word_index] & mask) {
                        let offset =
                            group_index * TICK_GROUP_SIZE + (word_index as i64) * 64 + lsb as i64;
                        return Some(self.tick_at_offset(offset));
                    }
                    word_index += 1;
                    mask = u64::MAX;
                }
            }
            group_index += 1;
            bit = 0;
        }
        None
    }
}
