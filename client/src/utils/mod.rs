//! Small helpers that do not belong to a specific auth component.

pub mod jwt;

#[cfg(test)]
pub(crate) mod test_tokens;
