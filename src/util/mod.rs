pub mod binary;
pub mod linspace;
pub mod radix_heap;
