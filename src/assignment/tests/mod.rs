//! Unit tests for the assignment module.
