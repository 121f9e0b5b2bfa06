//! Unit tests for issue reconciliation.
