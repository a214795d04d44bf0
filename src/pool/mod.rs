pub mod clmm_pool;
pub mod position;
pub mod rewarder;
pub mod swap;
pub mod tick;

#[cfg(test)]
pub(crate) mod testing;
