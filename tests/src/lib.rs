//! End-to-end scan scenarios against fake collaborators and loopback listeners.

#[cfg(test)]
mod discovery;
