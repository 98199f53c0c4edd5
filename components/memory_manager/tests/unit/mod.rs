//! Unit tests for memory_manager

mod test_interning;
