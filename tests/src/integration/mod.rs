//! Cross-node integration tests.

#[cfg(test)]
mod addressing;
#[cfg(test)]
mod mesh;
#[cfg(test)]
mod traversal;
