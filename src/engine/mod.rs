pub mod assignment;
pub mod drivers;
pub mod matching;
pub mod payment;
pub mod rides;
pub mod settlement;
pub mod trips;

#[cfg(test)]
pub(crate) mod test_support;
